//! Durable client storage trait.

use std::fmt;

use crate::Result;
use crate::storage::StorageKey;

/// Durable key/value storage for session state and preferences.
///
/// Reads and writes are synchronous; implementations are expected to be
/// local (a file, memory) rather than remote.
pub trait Storage: Send + Sync + fmt::Debug {
    /// Read the value stored under `key`.
    fn get(&self, key: StorageKey) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any existing value.
    fn set(&self, key: StorageKey, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: StorageKey) -> Result<()>;

    /// Store several entries at once.
    fn set_many(&self, entries: &[(StorageKey, String)]) -> Result<()> {
        for (key, value) in entries {
            self.set(*key, value)?;
        }
        Ok(())
    }

    /// Remove several keys at once.
    fn remove_many(&self, keys: &[StorageKey]) -> Result<()> {
        for key in keys {
            self.remove(*key)?;
        }
        Ok(())
    }

    /// Store `entries` and remove `removals` as one write.
    ///
    /// Backends shared between processes override this so a reader never
    /// sees half of the batch.
    fn write_batch(&self, entries: &[(StorageKey, String)], removals: &[StorageKey]) -> Result<()> {
        self.set_many(entries)?;
        self.remove_many(removals)
    }
}
