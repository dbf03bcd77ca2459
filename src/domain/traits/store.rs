use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::application::errors::StorageError;

/// Store trait - abstraction for key-value data persistence
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Load a JSON record, falling back to its default when the key is absent
pub async fn load_record<T>(store: &dyn Store, key: &str) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    match store.get(key).await? {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| StorageError::Serialization(e.to_string())),
        None => Ok(T::default()),
    }
}

/// Serialize a record as JSON under `key`
pub async fn save_record<T>(store: &dyn Store, key: &str, record: &T) -> Result<(), StorageError>
where
    T: Serialize + Sync,
{
    let raw = serde_json::to_string(record).map_err(|e| StorageError::Serialization(e.to_string()))?;
    store.set(key, &raw).await
}
