//! Test doubles for the network and the cache store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::fetch::Network;
use shelter_core::{CacheConfiguration, Error, MemoryCacheStore, NamedCacheStore, Request, RequestKey, ResponseSnapshot};

pub const ORIGIN: &str = "https://absolute.example";

pub fn url(path: &str) -> String {
    format!("{ORIGIN}{path}")
}

pub fn ok(body: &'static str) -> ResponseSnapshot {
    ResponseSnapshot::new(200, vec![("content-type".into(), "text/plain".into())], body)
}

pub fn config() -> CacheConfiguration {
    CacheConfiguration {
        origin: ORIGIN.into(),
        core_cache: "core-v2".into(),
        runtime_cache: "runtime-v2".into(),
        image_cache: "images-v2".into(),
        manifest: vec!["/a.js".into(), "/b.css".into()],
        max_image_entries: 50,
        excluded_paths: vec!["google-analytics".into()],
        fallback_document: "/index.html".into(),
        skip_waiting_on_install: true,
        app_name: "Absolute Fansub".into(),
    }
}

/// Network answering from a fixed URL → response table. Unknown URLs fail
/// like an unreachable host.
#[derive(Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, ResponseSnapshot>>,
    calls: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch waits for a permit on `gate` before answering.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self { gate: Some(gate), ..Default::default() }
    }

    pub fn respond(&self, url: &str, response: ResponseSnapshot) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn go_offline(&self) {
        self.routes.lock().unwrap().clear();
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, Error> {
        self.calls.lock().unwrap().push(request.url.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let route = self.routes.lock().unwrap().get(&request.url).cloned();
        route.ok_or_else(|| Error::Network(format!("{}: connection refused", request.url)))
    }
}

/// Store wrapper whose `delete_cache` fails for chosen cache names and whose
/// `put` fails for chosen URLs.
#[derive(Default)]
pub struct FailingStore {
    pub inner: MemoryCacheStore,
    pub fail_delete: Vec<String>,
    pub fail_put: Vec<String>,
}

#[async_trait]
impl NamedCacheStore for FailingStore {
    async fn open(&self, cache: &str) -> Result<(), Error> {
        self.inner.open(cache).await
    }

    async fn cache_names(&self) -> Result<Vec<String>, Error> {
        self.inner.cache_names().await
    }

    async fn delete_cache(&self, cache: &str) -> Result<bool, Error> {
        if self.fail_delete.iter().any(|c| c == cache) {
            return Err(Error::CacheOperation(format!("cannot delete {cache}")));
        }
        self.inner.delete_cache(cache).await
    }

    async fn put(&self, cache: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        if self.fail_put.iter().any(|u| *u == key.url) {
            return Err(Error::CacheOperation(format!("cannot write {}", key.url)));
        }
        self.inner.put(cache, key, response).await
    }

    async fn get(&self, cache: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        self.inner.get(cache, key).await
    }

    async fn match_any(&self, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        self.inner.match_any(key).await
    }

    async fn keys(&self, cache: &str) -> Result<Vec<RequestKey>, Error> {
        self.inner.keys(cache).await
    }

    async fn delete(&self, cache: &str, key: &RequestKey) -> Result<bool, Error> {
        self.inner.delete(cache, key).await
    }
}
