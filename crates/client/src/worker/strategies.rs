//! The four caching strategies.
//!
//! Strategies never fail: every error path degrades to a cached copy, a
//! placeholder or the Offline response. Cache write failures are logged and
//! never change what the caller receives.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use url::Url;

use crate::fetch::{Network, parse_origin, resolve};
use shelter_core::{CacheConfiguration, Destination, Error, NamedCacheStore, Request, ResponseSnapshot};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
    /// The configured fallback document stood in for the requested one.
    Fallback,
    Placeholder,
    Offline,
}

/// Outcome of a strategy.
#[derive(Debug)]
pub struct Served {
    pub response: ResponseSnapshot,
    pub source: ResponseSource,
    /// Background refresh started by stale-while-revalidate.
    pub revalidation: Option<JoinHandle<()>>,
}

impl Served {
    fn new(response: ResponseSnapshot, source: ResponseSource) -> Self {
        Self { response, source, revalidation: None }
    }

    fn offline() -> Self {
        Self::new(ResponseSnapshot::offline(), ResponseSource::Offline)
    }
}

/// Shared collaborators of every strategy.
#[derive(Clone)]
pub struct WorkerContext {
    pub config: Arc<CacheConfiguration>,
    pub caches: Arc<dyn NamedCacheStore>,
    pub network: Arc<dyn Network>,
    origin: Url,
}

impl WorkerContext {
    pub fn new(
        config: CacheConfiguration, caches: Arc<dyn NamedCacheStore>, network: Arc<dyn Network>,
    ) -> Result<Self, Error> {
        let origin = parse_origin(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        Ok(Self { config: Arc::new(config), caches, network, origin })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Absolute URL of a root-relative path.
    pub fn absolute(&self, path: &str) -> Result<String, Error> {
        resolve(&self.origin, path)
            .map(String::from)
            .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
    }

    /// `match_any` that treats store errors as misses.
    async fn lookup(&self, request: &Request) -> Option<ResponseSnapshot> {
        if !request.is_cacheable() {
            return None;
        }
        match self.caches.match_any(&request.key()).await {
            Ok(Some(hit)) => {
                tracing::debug!("cache hit: {}", request.url);
                Some(hit)
            }
            Ok(None) => {
                tracing::debug!("cache miss: {}", request.url);
                None
            }
            Err(e) => {
                tracing::warn!("cache lookup failed for {}: {e}", request.url);
                None
            }
        }
    }

    async fn store(&self, cache: &str, request: &Request, response: &ResponseSnapshot) {
        if !request.is_cacheable() {
            return;
        }
        if let Err(e) = self.caches.put(cache, &request.key(), response).await {
            tracing::warn!("failed to write {} into {cache}: {e}", request.url);
        }
    }

    /// Make room for one more entry in the images cache.
    async fn evict_images(&self) -> Result<(), Error> {
        let cache = &self.config.image_cache;
        let bound = self.config.max_image_entries;
        let keys = self.caches.keys(cache).await?;
        if keys.len() < bound {
            return Ok(());
        }

        let excess = keys.len() + 1 - bound;
        for key in keys.iter().take(excess) {
            self.caches.delete(cache, key).await?;
            tracing::debug!("evicted {key} from {cache}");
        }
        Ok(())
    }
}

/// Images: serve from cache without touching the network; otherwise fetch,
/// evict the oldest entry when the images cache is full, and store.
pub async fn cache_first_with_eviction(ctx: &WorkerContext, request: &Request) -> Served {
    if let Some(hit) = ctx.lookup(request).await {
        return Served::new(hit, ResponseSource::Cache);
    }

    match ctx.network.fetch(request).await {
        Ok(response) => {
            if response.status == 200 && request.is_cacheable() {
                if let Err(e) = ctx.evict_images().await {
                    tracing::warn!("image eviction failed: {e}");
                }
                ctx.store(&ctx.config.image_cache, request, &response).await;
            }
            Served::new(response, ResponseSource::Network)
        }
        Err(e) => {
            tracing::warn!("image fetch failed, serving placeholder: {e}");
            Served::new(ResponseSnapshot::image_placeholder(), ResponseSource::Placeholder)
        }
    }
}

/// Documents: prefer the network and refresh the runtime cache; offline,
/// fall back to the cached copy, then the fallback document.
pub async fn network_first_with_fallback(ctx: &WorkerContext, request: &Request) -> Served {
    match ctx.network.fetch(request).await {
        Ok(response) => {
            ctx.store(&ctx.config.runtime_cache, request, &response).await;
            return Served::new(response, ResponseSource::Network);
        }
        Err(e) => tracing::warn!("document fetch failed for {}: {e}", request.url),
    }

    if let Some(hit) = ctx.lookup(request).await {
        return Served::new(hit, ResponseSource::Cache);
    }

    let fallback = match ctx.absolute(&ctx.config.fallback_document) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("bad fallback document: {e}");
            return Served::offline();
        }
    };
    match ctx.lookup(&Request::get(fallback, Destination::Document)).await {
        Some(hit) => Served::new(hit, ResponseSource::Fallback),
        None => Served::offline(),
    }
}

/// Scripts and styles: answer from cache at once and refresh it in the
/// background; on a miss, fetch and store.
pub async fn stale_while_revalidate(ctx: &WorkerContext, request: &Request) -> Served {
    if let Some(hit) = ctx.lookup(request).await {
        let background = ctx.clone();
        let request = request.clone();
        let handle = tokio::spawn(async move {
            match background.network.fetch(&request).await {
                Ok(fresh) if fresh.status == 200 => {
                    background.store(&background.config.core_cache, &request, &fresh).await;
                    tracing::debug!("revalidated {}", request.url);
                }
                Ok(fresh) => tracing::debug!("revalidation of {} returned {}", request.url, fresh.status),
                Err(e) => tracing::warn!("revalidation of {} failed: {e}", request.url),
            }
        });
        return Served { response: hit, source: ResponseSource::Cache, revalidation: Some(handle) };
    }

    match ctx.network.fetch(request).await {
        Ok(response) => {
            if response.status == 200 {
                ctx.store(&ctx.config.core_cache, request, &response).await;
            }
            Served::new(response, ResponseSource::Network)
        }
        Err(e) => {
            tracing::warn!("asset fetch failed for {}: {e}", request.url);
            Served::offline()
        }
    }
}

/// Everything else: network, then cache, then Offline.
pub async fn network_with_cache_fallback(ctx: &WorkerContext, request: &Request) -> Served {
    match ctx.network.fetch(request).await {
        Ok(response) => Served::new(response, ResponseSource::Network),
        Err(e) => {
            tracing::warn!("fetch failed for {}: {e}", request.url);
            match ctx.lookup(request).await {
                Some(hit) => Served::new(hit, ResponseSource::Cache),
                None => Served::offline(),
            }
        }
    }
}
