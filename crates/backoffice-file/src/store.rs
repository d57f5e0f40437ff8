//! JSON file storage.
//!
//! All entries live in one JSON object on disk. Every write is a
//! read-modify-write under an exclusive lock on a sidecar `.lock` file,
//! and lands through a temp file and rename so readers never see a torn
//! file.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, instrument};

use backoffice_core::Result;
use backoffice_core::error::{Error, StorageError};
use backoffice_core::storage::StorageKey;
use backoffice_core::traits::Storage;

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

type Entries = BTreeMap<String, String>;

/// Durable storage in a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Use the file at `path`. It is created on first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Use `storage.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn io_error(&self, err: std::io::Error) -> Error {
        StorageError::Io {
            path: self.path.display().to_string(),
            message: err.to_string(),
        }
        .into()
    }

    fn open_lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| self.io_error(e))
    }

    fn read_entries(&self) -> Result<Entries> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            StorageError::Corrupt {
                path: self.path.display().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    fn write_entries(&self, entries: &Entries) -> Result<()> {
        let json = serde_json::to_string_pretty(entries).map_err(|e| StorageError::Serialize {
            key: "storage".to_string(),
            message: e.to_string(),
        })?;

        let temp_path = self.path.with_extension("tmp");
        let mut options = OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&temp_path).map_err(|e| self.io_error(e))?;
        // The mode only applies on create; a leftover temp file keeps its own.
        #[cfg(unix)]
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| self.io_error(e))?;
        file.write_all(json.as_bytes()).map_err(|e| self.io_error(e))?;

        fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(e))
    }

    /// Apply `f` to the stored entries under the exclusive lock.
    fn update(&self, f: impl FnOnce(&mut Entries)) -> Result<()> {
        let lock = self.open_lock()?;
        lock.lock_exclusive().map_err(|e| self.io_error(e))?;

        let result = self.read_entries().and_then(|mut entries| {
            f(&mut entries);
            self.write_entries(&entries)
        });

        let _ = FileExt::unlock(&lock);
        result
    }
}

impl Storage for FileStorage {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn get(&self, key: StorageKey) -> Result<Option<String>> {
        let lock = self.open_lock()?;
        lock.lock_shared().map_err(|e| self.io_error(e))?;
        let result = self.read_entries();
        let _ = FileExt::unlock(&lock);

        Ok(result?.remove(key.as_str()))
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        debug!("Writing storage entry");
        self.update(|entries| {
            entries.insert(key.as_str().to_string(), value.to_string());
        })
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn remove(&self, key: StorageKey) -> Result<()> {
        self.update(|entries| {
            entries.remove(key.as_str());
        })
    }

    #[instrument(skip_all, fields(path = %self.path.display(), count = entries.len()))]
    fn set_many(&self, entries: &[(StorageKey, String)]) -> Result<()> {
        self.update(|stored| {
            for (key, value) in entries {
                stored.insert(key.as_str().to_string(), value.clone());
            }
        })
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn remove_many(&self, keys: &[StorageKey]) -> Result<()> {
        self.update(|stored| {
            for key in keys {
                stored.remove(key.as_str());
            }
        })
    }

    #[instrument(skip_all, fields(path = %self.path.display(), set = entries.len(), removed = removals.len()))]
    fn write_batch(&self, entries: &[(StorageKey, String)], removals: &[StorageKey]) -> Result<()> {
        self.update(|stored| {
            for (key, value) in entries {
                stored.insert(key.as_str().to_string(), value.clone());
            }
            for key in removals {
                stored.remove(key.as_str());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        assert!(storage.get(StorageKey::AccessToken).unwrap().is_none());
        assert!(!storage.path().exists());
    }

    #[test]
    fn values_survive_a_new_handle() {
        let dir = TempDir::new().unwrap();
        FileStorage::in_dir(dir.path())
            .set(StorageKey::Language, "en")
            .unwrap();

        let reopened = FileStorage::in_dir(dir.path());
        assert_eq!(reopened.get(StorageKey::Language).unwrap().as_deref(), Some("en"));
    }

    #[test]
    fn uses_persisted_key_names() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        storage.set(StorageKey::CurrentTenant, "42").unwrap();

        let raw = fs::read_to_string(storage.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["currentTenant"], "42");
    }

    #[test]
    fn remove_many_keeps_other_entries() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        storage
            .set_many(&[
                (StorageKey::AccessToken, "T1".to_string()),
                (StorageKey::RefreshToken, "R1".to_string()),
                (StorageKey::Language, "en".to_string()),
            ])
            .unwrap();

        storage.remove_many(&StorageKey::SESSION).unwrap();

        assert!(storage.get(StorageKey::AccessToken).unwrap().is_none());
        assert!(storage.get(StorageKey::RefreshToken).unwrap().is_none());
        assert_eq!(storage.get(StorageKey::Language).unwrap().as_deref(), Some("en"));
    }

    #[test]
    fn write_batch_applies_sets_and_removals_together() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        storage
            .set_many(&[
                (StorageKey::AccessToken, "T1".to_string()),
                (StorageKey::User, r#"{"email":"old@b.com"}"#.to_string()),
            ])
            .unwrap();

        storage
            .write_batch(&[(StorageKey::AccessToken, "T2".to_string())], &[StorageKey::User])
            .unwrap();

        let raw = fs::read_to_string(storage.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json, serde_json::json!({"accessToken": "T2"}));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        fs::write(storage.path(), "{not json").unwrap();

        let err = storage.get(StorageKey::User).unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Corrupt { .. })));
    }

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::in_dir(dir.path().join("nested").join("data"));
        storage.set(StorageKey::Roles, "[]").unwrap();
        assert!(storage.path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn file_is_private_to_owner() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        storage.set(StorageKey::AccessToken, "T1").unwrap();

        let mode = fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn leftover_temp_file_is_made_private() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        let temp = storage.path().with_extension("tmp");
        fs::write(&temp, "stale").unwrap();
        fs::set_permissions(&temp, fs::Permissions::from_mode(0o644)).unwrap();

        storage.set(StorageKey::RefreshToken, "R1").unwrap();

        let mode = fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!temp.exists());
    }
}
