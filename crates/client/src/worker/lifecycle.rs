//! Installation and activation of a cache generation.

use futures_util::future::join_all;
use serde::Serialize;

use super::strategies::WorkerContext;
use shelter_core::{Destination, Error, Request, RequestKey, ResponseSnapshot};

/// Lifecycle state of one worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Installing,
    Waiting,
    Active,
    Superseded,
    /// Installation did not complete; this version never serves.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub cache: String,
    /// Number of manifest entries now in the core cache.
    pub cached: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct ActivationReport {
    pub deleted: Vec<String>,
    /// Stale caches whose deletion failed, with the reason.
    pub failed: Vec<(String, String)>,
    pub clients_claimed: bool,
}

/// Installs and activates the configured generation over the worker's stores.
pub struct CacheRegistry {
    ctx: WorkerContext,
}

impl CacheRegistry {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }

    /// Populate the core cache with the manifest.
    ///
    /// All manifest entries are fetched before anything is written. One
    /// transport failure or non-2xx status fails the whole installation with
    /// `ManifestFetch` and leaves the core cache as it was. A failed write
    /// rolls back the entries already written.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let config = &self.ctx.config;
        tracing::info!("installing cache generation {}", config.core_cache);

        let urls = config
            .manifest
            .iter()
            .map(|path| self.ctx.absolute(path).map_err(|e| Error::ManifestFetch(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        let existed = self.ctx.caches.cache_names().await?.contains(&config.core_cache);
        self.ctx.caches.open(&config.core_cache).await?;

        let requests: Vec<Request> = urls.into_iter().map(|url| Request::get(url, Destination::Empty)).collect();
        let fetched = join_all(requests.iter().map(|request| self.ctx.network.fetch(request))).await;

        let mut responses = Vec::with_capacity(fetched.len());
        for (request, result) in requests.iter().zip(fetched) {
            match result {
                Ok(response) if response.is_ok() => responses.push((request.key(), response)),
                Ok(response) => {
                    let err = Error::ManifestFetch(format!("{} returned {}", request.url, response.status));
                    tracing::error!("install of {} failed: {err}", config.core_cache);
                    return Err(err);
                }
                Err(e) => {
                    let err = Error::ManifestFetch(format!("{}: {e}", request.url));
                    tracing::error!("install of {} failed: {err}", config.core_cache);
                    return Err(err);
                }
            }
        }

        let mut written = Vec::with_capacity(responses.len());
        for (key, response) in &responses {
            let previous = if existed { self.ctx.caches.get(&config.core_cache, key).await? } else { None };
            if let Err(e) = self.ctx.caches.put(&config.core_cache, key, response).await {
                tracing::error!("install of {} failed writing {}: {e}", config.core_cache, key.url);
                self.roll_back(existed, written).await;
                return Err(e);
            }
            written.push((key, previous));
        }

        tracing::info!("cached {} core files in {}", responses.len(), config.core_cache);
        Ok(InstallReport { cache: config.core_cache.clone(), cached: responses.len() })
    }

    /// Undo a partial install: drop a core cache this install created, or
    /// restore the entries it overwrote.
    async fn roll_back(&self, existed: bool, written: Vec<(&RequestKey, Option<ResponseSnapshot>)>) {
        let cache = &self.ctx.config.core_cache;
        if !existed {
            if let Err(e) = self.ctx.caches.delete_cache(cache).await {
                tracing::warn!("rollback of {cache} failed: {e}");
            }
            return;
        }

        for (key, previous) in written {
            let restored = match previous {
                Some(response) => self.ctx.caches.put(cache, key, &response).await,
                None => self.ctx.caches.delete(cache, key).await.map(|_| ()),
            };
            if let Err(e) = restored {
                tracing::warn!("rollback of {} in {cache} failed: {e}", key.url);
            }
        }
    }

    /// Delete every cache outside the current generation, then claim clients.
    ///
    /// Individual deletion failures are logged and reported but never stop
    /// activation.
    pub async fn activate(&self) -> ActivationReport {
        let config = &self.ctx.config;
        tracing::info!("activating cache generation {}", config.core_cache);

        let names = match self.ctx.caches.cache_names().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!("could not enumerate caches during activation: {e}");
                Vec::new()
            }
        };

        let stale: Vec<String> = names.into_iter().filter(|name| !config.is_current(name)).collect();
        let results = join_all(stale.iter().map(|name| self.ctx.caches.delete_cache(name))).await;

        let mut report = ActivationReport::default();
        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(_) => {
                    tracing::info!("removed stale cache {name}");
                    report.deleted.push(name);
                }
                Err(e) => {
                    let err = Error::CacheOperation(format!("failed to delete {name}: {e}"));
                    tracing::warn!("{err}");
                    report.failed.push((name, err.to_string()));
                }
            }
        }

        report.clients_claimed = true;
        report
    }
}
