//! Key-value storage implementations

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::traits::Store;
use crate::application::errors::StorageError;

/// JSON file-backed store. Every write flushes the whole map.
pub struct JsonStore {
    path: PathBuf,
    kv: Arc<RwLock<BTreeMap<String, String>>>,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kv: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Create the parent directory and load existing data
    pub async fn init(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let loaded: BTreeMap<String, String> = serde_json::from_str(&content)
                    .map_err(|e| StorageError::Serialization(format!("{}: {}", self.path.display(), e)))?;
                *self.kv.write().await = loaded;
                tracing::info!("Loaded {} record(s) from {}", self.kv.read().await.len(), self.path.display());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No data file at {}, starting empty", self.path.display());
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn flush(&self, kv: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(kv)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for JsonStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let kv = self.kv.read().await;
        Ok(kv.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut kv = self.kv.write().await;
        kv.insert(key.to_string(), value.to_string());
        self.flush(&kv).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut kv = self.kv.write().await;
        if kv.remove(key).is_some() {
            self.flush(&kv).await?;
        }
        Ok(())
    }
}

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    kv: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.kv.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.kv.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.kv.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::{load_record, save_record};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Counter {
        hits: u32,
    }

    #[tokio::test]
    async fn test_json_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = JsonStore::new(&path);
        store.init().await.unwrap();
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        store.delete("a").await.unwrap();

        let reopened = JsonStore::new(&path);
        reopened.init().await.unwrap();
        assert_eq!(reopened.get("a").await.unwrap(), None);
        assert_eq!(reopened.get("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let store = JsonStore::new(&path);
        assert!(matches!(store.init().await, Err(StorageError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_records_default_when_absent() {
        let store = MemoryStore::new();
        let counter: Counter = load_record(&store, "counter").await.unwrap();
        assert_eq!(counter, Counter::default());

        save_record(&store, "counter", &Counter { hits: 3 }).await.unwrap();
        let counter: Counter = load_record(&store, "counter").await.unwrap();
        assert_eq!(counter.hits, 3);
    }
}
