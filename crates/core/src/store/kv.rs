//! Persistent key/value storage with JSON-serialized values.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::Error;

/// String-keyed storage for small preference values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Raw stored text for a key.
    async fn get_raw(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store raw text under a key, replacing any previous value.
    async fn set_raw(&self, key: &str, value: String) -> Result<(), Error>;

    /// Remove a key. Returns false if it was not present.
    async fn remove(&self, key: &str) -> Result<bool, Error>;
}

/// Read and deserialize a JSON value.
pub async fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, Error> {
    match store.get_raw(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize and store a JSON value.
pub async fn set_json<T: Serialize + ?Sized + Sync>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), Error> {
    let raw = serde_json::to_string(value)?;
    store.set_raw(key, raw).await
}

/// In-process `KeyValueStore`.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set_raw(&self, key: &str, value: String) -> Result<(), Error> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, Error> {
        Ok(self.values.write().await.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_round_trip() {
        let store = MemoryKeyValueStore::new();
        set_json(&store, "ids", &vec![3u32, 1, 2]).await.unwrap();

        let ids: Option<Vec<u32>> = get_json(&store, "ids").await.unwrap();
        assert_eq!(ids, Some(vec![3, 1, 2]));
        assert_eq!(store.get_raw("ids").await.unwrap().as_deref(), Some("[3,1,2]"));
    }

    #[tokio::test]
    async fn test_corrupt_value_is_storage_error() {
        let store = MemoryKeyValueStore::new();
        store.set_raw("ids", "{oops".into()).await.unwrap();

        let result: Result<Option<Vec<u32>>, Error> = get_json(&store, "ids").await;
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemoryKeyValueStore::new();
        store.set_raw("k", "\"v\"".into()).await.unwrap();
        assert!(store.remove("k").await.unwrap());
        assert!(!store.remove("k").await.unwrap());
        assert!(store.get_raw("k").await.unwrap().is_none());
    }
}
