//! In-memory settings store.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::ConfigStore;
use crate::error::Result;

/// Settings store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    flags: Mutex<BTreeMap<String, bool>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given flags.
    pub fn with_flags<'a>(flags: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        let map = flags
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self {
            flags: Mutex::new(map),
        }
    }

    fn flags(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, bool>> {
        // A poisoned map is still a valid map
        self.flags.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get_flag(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.flags().get(key).copied())
    }

    async fn set_flag(&self, key: &str, value: bool) -> Result<()> {
        self.flags().insert(key.to_string(), value);
        Ok(())
    }
}
