//! In-memory storage backend.
//!
//! Used by tests and by callers that want an ephemeral engine with no data
//! directory. Write failure can be injected to exercise the engine's
//! swallow-and-log persistence path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::traits::Storage;

/// Storage backend holding values in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    // Locked per call, never held across an await.
    values: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `set`/`remove` calls fail until switched back.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("simulated write failure for key {}", key);
        }
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("simulated write failure for key {}", key);
        }
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let storage = MemoryStorage::new();

        assert_eq!(storage.get("k").await.unwrap(), None);
        storage.set("k", "v").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("v"));
        storage.remove("k").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let storage = MemoryStorage::new();

        storage.fail_writes(true);
        assert!(storage.set("k", "v").await.is_err());
        assert!(storage.remove("k").await.is_err());
        // Reads keep working.
        assert_eq!(storage.get("k").await.unwrap(), None);

        storage.fail_writes(false);
        storage.set("k", "v").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
