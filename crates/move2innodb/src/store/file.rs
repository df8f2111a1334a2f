//! JSON file settings store.
//!
//! The file holds a flat object of key to boolean:
//!
//! ```json
//! { "move2InnoDB.IKnowWhatIDo": true, "move2InnoDB.UseInnoDB": true }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::core::ConfigStore;
use crate::error::{MigrateError, Result};

/// Settings store persisted to a JSON file.
///
/// Every write rewrites the whole file through a temp file and rename, so a
/// crash never leaves a half-written file behind.
pub struct FileConfigStore {
    path: PathBuf,
    flags: Mutex<BTreeMap<String, bool>>,
}

impl FileConfigStore {
    /// Open the store, reading the file if it exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let flags = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    MigrateError::Config(format!(
                        "Invalid settings file {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened settings store {:?} ({} flags)", path, flags.len());
        Ok(Self {
            path,
            flags: Mutex::new(flags),
        })
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, flags: &BTreeMap<String, bool>) -> Result<()> {
        let content = serde_json::to_string_pretty(flags)?;

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, content).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn get_flag(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.flags.lock().await.get(key).copied())
    }

    async fn set_flag(&self, key: &str, value: bool) -> Result<()> {
        let mut flags = self.flags.lock().await;
        let previous = flags.insert(key.to_string(), value);
        if let Err(e) = self.persist(&flags).await {
            // Keep memory consistent with what is on disk
            match previous {
                Some(old) => flags.insert(key.to_string(), old),
                None => flags.remove(key),
            };
            return Err(e);
        }
        debug!("Set {} = {}", key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CONSENT_KEY, USE_INNODB_KEY};

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::open(dir.path().join("flags.json")).unwrap();
        assert_eq!(store.get_flag(CONSENT_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_flags_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.json");

        {
            let store = FileConfigStore::open(&path).unwrap();
            store.set_flag(CONSENT_KEY, true).await.unwrap();
            store.set_flag(USE_INNODB_KEY, false).await.unwrap();
        }

        let reopened = FileConfigStore::open(&path).unwrap();
        assert_eq!(reopened.path(), path.as_path());
        assert_eq!(reopened.get_flag(CONSENT_KEY).await.unwrap(), Some(true));
        assert_eq!(reopened.get_flag(USE_INNODB_KEY).await.unwrap(), Some(false));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            FileConfigStore::open(&path),
            Err(MigrateError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_memory() {
        let dir = tempfile::tempdir().unwrap();
        // Parent directory does not exist, so persisting fails
        let store = FileConfigStore::open(dir.path().join("missing/flags.json")).unwrap();
        assert!(store.set_flag(CONSENT_KEY, true).await.is_err());
        assert_eq!(store.get_flag(CONSENT_KEY).await.unwrap(), None);
    }
}
