//! Named response caches.
//!
//! A named cache maps request identities to response snapshots. Caches are created
//! lazily on first open or put, enumerate their keys in insertion order, and live
//! until deleted. Replacing an entry moves it to the end of the order.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::http::{RequestKey, ResponseSnapshot};

/// Storage interface shared by the worker's lifecycle and strategies.
#[async_trait]
pub trait NamedCacheStore: Send + Sync {
    /// Create the cache if it does not exist yet.
    async fn open(&self, cache: &str) -> Result<(), Error>;

    /// Names of every existing cache, in creation order.
    async fn cache_names(&self) -> Result<Vec<String>, Error>;

    /// Delete a cache and all of its entries. Returns false if it did not exist.
    async fn delete_cache(&self, cache: &str) -> Result<bool, Error>;

    /// Insert or replace an entry, creating the cache if needed.
    ///
    /// Fails with `InvalidInput` for non-GET keys.
    async fn put(&self, cache: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error>;

    /// Look up an entry in one cache.
    async fn get(&self, cache: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error>;

    /// Look up an entry across every cache, first hit in creation order.
    async fn match_any(&self, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error>;

    /// Keys of one cache in insertion order. Empty for a missing cache.
    async fn keys(&self, cache: &str) -> Result<Vec<RequestKey>, Error>;

    /// Delete one entry. Returns false if it was not present.
    async fn delete(&self, cache: &str, key: &RequestKey) -> Result<bool, Error>;
}

#[derive(Debug)]
struct MemoryCache {
    name: String,
    entries: Vec<(RequestKey, ResponseSnapshot)>,
}

/// In-process `NamedCacheStore`, used by tests and ephemeral workers.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    caches: RwLock<Vec<MemoryCache>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NamedCacheStore for MemoryCacheStore {
    async fn open(&self, cache: &str) -> Result<(), Error> {
        let mut caches = self.caches.write().await;
        if !caches.iter().any(|c| c.name == cache) {
            caches.push(MemoryCache { name: cache.to_string(), entries: Vec::new() });
        }
        Ok(())
    }

    async fn cache_names(&self) -> Result<Vec<String>, Error> {
        Ok(self.caches.read().await.iter().map(|c| c.name.clone()).collect())
    }

    async fn delete_cache(&self, cache: &str) -> Result<bool, Error> {
        let mut caches = self.caches.write().await;
        let before = caches.len();
        caches.retain(|c| c.name != cache);
        Ok(caches.len() != before)
    }

    async fn put(&self, cache: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        key.ensure_cacheable()?;

        let mut caches = self.caches.write().await;
        let index = match caches.iter().position(|c| c.name == cache) {
            Some(i) => i,
            None => {
                caches.push(MemoryCache { name: cache.to_string(), entries: Vec::new() });
                caches.len() - 1
            }
        };

        let entries = &mut caches[index].entries;
        entries.retain(|(k, _)| k != key);
        entries.push((key.clone(), response.clone()));
        Ok(())
    }

    async fn get(&self, cache: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        let caches = self.caches.read().await;
        Ok(caches
            .iter()
            .find(|c| c.name == cache)
            .and_then(|c| c.entries.iter().find(|(k, _)| k == key))
            .map(|(_, r)| r.clone()))
    }

    async fn match_any(&self, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        let caches = self.caches.read().await;
        Ok(caches
            .iter()
            .find_map(|c| c.entries.iter().find(|(k, _)| k == key))
            .map(|(_, r)| r.clone()))
    }

    async fn keys(&self, cache: &str) -> Result<Vec<RequestKey>, Error> {
        let caches = self.caches.read().await;
        Ok(caches
            .iter()
            .find(|c| c.name == cache)
            .map(|c| c.entries.iter().map(|(k, _)| k.clone()).collect())
            .unwrap_or_default())
    }

    async fn delete(&self, cache: &str, key: &RequestKey) -> Result<bool, Error> {
        let mut caches = self.caches.write().await;
        let Some(c) = caches.iter_mut().find(|c| c.name == cache) else {
            return Ok(false);
        };
        let before = c.entries.len();
        c.entries.retain(|(k, _)| k != key);
        Ok(c.entries.len() != before)
    }
}
