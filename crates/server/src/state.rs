//! Shared state behind every tool call.

use std::sync::Arc;

use shelter_client::{DeployOutcome, Network, Registration, ServiceWorker};
use shelter_core::prefs::{Favorites, LogNotifier, Notifier, ThemeStore};
use shelter_core::{AppConfig, CacheDb, Error, KeyValueStore};

pub struct AppState {
    pub config: AppConfig,
    pub db: CacheDb,
    pub network: Arc<dyn Network>,
    pub registration: Registration,
    pub favorites: Favorites,
    pub themes: ThemeStore,
}

impl AppState {
    pub fn new(config: AppConfig, db: CacheDb, network: Arc<dyn Network>) -> Self {
        let store: Arc<dyn KeyValueStore> = Arc::new(db.clone());
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
        Self {
            favorites: Favorites::new(store.clone(), notifier.clone()),
            themes: ThemeStore::new(store, notifier),
            registration: Registration::new(),
            config,
            db,
            network,
        }
    }

    /// A new worker version over the shared stores.
    ///
    /// `cache_version` overrides the configured core cache name, which is how
    /// a new generation is rolled out.
    pub fn worker(&self, cache_version: Option<&str>) -> Result<Arc<ServiceWorker>, Error> {
        let mut cache_config = self.config.cache_configuration();
        if let Some(version) = cache_version {
            let version = version.trim();
            if version.is_empty() {
                return Err(Error::InvalidInput("cache_version cannot be empty".into()));
            }
            if version == cache_config.runtime_cache || version == cache_config.image_cache {
                return Err(Error::InvalidInput(format!("cache_version '{version}' collides with another cache")));
            }
            cache_config.core_cache = version.to_string();
        }
        let worker = ServiceWorker::new(cache_config, Arc::new(self.db.clone()), self.network.clone())?;
        Ok(Arc::new(worker))
    }

    /// Install and activate the configured version.
    pub async fn bootstrap(&self) -> Result<DeployOutcome, Error> {
        let worker = self.worker(None)?;
        self.registration.deploy(worker).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use shelter_client::Network;
    use shelter_core::{AppConfig, CacheDb, Error, Request, ResponseSnapshot};

    use super::AppState;

    pub const ORIGIN: &str = "https://absolute.example";

    /// Network serving a fixed set of paths under [`ORIGIN`].
    #[derive(Default)]
    pub struct StubNetwork {
        pub routes: Mutex<HashMap<String, ResponseSnapshot>>,
    }

    impl StubNetwork {
        pub fn serve(&self, path: &str, body: &'static str) {
            let response = ResponseSnapshot::new(200, vec![("content-type".into(), "text/plain".into())], body);
            self.routes.lock().unwrap().insert(format!("{ORIGIN}{path}"), response);
        }
    }

    #[async_trait]
    impl Network for StubNetwork {
        async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, Error> {
            let route = self.routes.lock().unwrap().get(&request.url).cloned();
            route.ok_or_else(|| Error::Network(format!("{}: unreachable", request.url)))
        }
    }

    /// State over an in-memory database with a two-file manifest.
    pub async fn state() -> (Arc<AppState>, Arc<StubNetwork>) {
        let config = AppConfig {
            origin: ORIGIN.into(),
            manifest: vec!["/index.html".into(), "/style.css".into()],
            ..Default::default()
        };
        let network = Arc::new(StubNetwork::default());
        network.serve("/index.html", "<h1>home</h1>");
        network.serve("/style.css", "body{}");
        let db = CacheDb::open_in_memory().await.unwrap();
        (Arc::new(AppState::new(config, db, network.clone())), network)
    }

    /// Parse the JSON text of a tool result.
    pub fn output(result: &rmcp::model::CallToolResult) -> serde_json::Value {
        let content = serde_json::to_value(&result.content[0]).unwrap();
        let text = content.get("text").and_then(|v| v.as_str()).expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
