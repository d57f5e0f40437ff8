//! Storage keys and the in-memory storage backend.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use crate::Result;
use crate::error::InvalidInputError;
use crate::traits::Storage;

/// Every key the client persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    AccessToken,
    RefreshToken,
    User,
    Roles,
    Permissions,
    CurrentTenant,
    Language,
}

impl StorageKey {
    /// Keys wiped when the session is destroyed. Everything except the
    /// language preference.
    pub const SESSION: [StorageKey; 6] = [
        StorageKey::AccessToken,
        StorageKey::RefreshToken,
        StorageKey::User,
        StorageKey::Roles,
        StorageKey::Permissions,
        StorageKey::CurrentTenant,
    ];

    pub const ALL: [StorageKey; 7] = [
        StorageKey::AccessToken,
        StorageKey::RefreshToken,
        StorageKey::User,
        StorageKey::Roles,
        StorageKey::Permissions,
        StorageKey::CurrentTenant,
        StorageKey::Language,
    ];

    /// The persisted name of this key.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::AccessToken => "accessToken",
            StorageKey::RefreshToken => "refreshToken",
            StorageKey::User => "user",
            StorageKey::Roles => "roles",
            StorageKey::Permissions => "permissions",
            StorageKey::CurrentTenant => "currentTenant",
            StorageKey::Language => "language",
        }
    }

    /// True if the key belongs to the session and is cleared on logout.
    pub fn is_session_scoped(&self) -> bool {
        Self::SESSION.contains(self)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                InvalidInputError::Other {
                    message: format!("unknown storage key '{s}'"),
                }
                .into()
            })
    }
}

/// Storage that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<StorageKey, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: StorageKey) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(&key).cloned())
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&key);
        Ok(())
    }

    fn write_batch(&self, batch: &[(StorageKey, String)], removals: &[StorageKey]) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in batch {
            entries.insert(*key, value.clone());
        }
        for key in removals {
            entries.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_is_not_session_scoped() {
        assert!(!StorageKey::Language.is_session_scoped());
        assert!(StorageKey::CurrentTenant.is_session_scoped());
        assert!(StorageKey::AccessToken.is_session_scoped());
    }

    #[test]
    fn key_names_parse_back() {
        for key in StorageKey::ALL {
            assert_eq!(key.as_str().parse::<StorageKey>().unwrap(), key);
        }
        assert!("theme".parse::<StorageKey>().is_err());
    }

    #[test]
    fn memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        assert!(storage.get(StorageKey::Language).unwrap().is_none());

        storage.set(StorageKey::Language, "en").unwrap();
        assert_eq!(storage.get(StorageKey::Language).unwrap().as_deref(), Some("en"));

        storage.remove(StorageKey::Language).unwrap();
        storage.remove(StorageKey::Language).unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn remove_many_leaves_other_keys() {
        let storage = MemoryStorage::new();
        storage
            .set_many(&[
                (StorageKey::AccessToken, "T1".into()),
                (StorageKey::Language, "en".into()),
            ])
            .unwrap();

        storage.remove_many(&StorageKey::SESSION).unwrap();

        assert_eq!(storage.len(), 1);
        assert!(storage.get(StorageKey::Language).unwrap().is_some());
    }

    #[test]
    fn write_batch_sets_and_removes() {
        let storage = MemoryStorage::new();
        storage.set(StorageKey::User, "{}").unwrap();

        storage
            .write_batch(&[(StorageKey::AccessToken, "T2".into())], &[StorageKey::User])
            .unwrap();

        assert_eq!(storage.get(StorageKey::AccessToken).unwrap().as_deref(), Some("T2"));
        assert!(storage.get(StorageKey::User).unwrap().is_none());
    }
}
