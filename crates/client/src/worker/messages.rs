//! Control messages posted to the worker by pages.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use super::strategies::WorkerContext;
use shelter_core::{Destination, Request};

/// A message from a controlled page, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Let a waiting worker take over now.
    SkipWaiting,
    /// Warm the runtime cache with these URLs.
    CacheUrls { urls: Vec<String> },
}

impl ControlMessage {
    /// Parse a posted message. Anything unrecognized is `None`.
    pub fn parse(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct CacheUrlsReport {
    pub stored: usize,
    pub failed: usize,
}

/// Fetch every URL concurrently and keep the 200 responses in the runtime cache.
///
/// Individual failures (bad URL, transport error, other status, write error)
/// are counted and logged, never propagated.
pub async fn cache_urls(ctx: &WorkerContext, urls: &[String]) -> CacheUrlsReport {
    let cache = &ctx.config.runtime_cache;
    let results = join_all(urls.iter().map(|raw| async move {
        let url = match ctx.absolute(raw) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("CACHE_URLS skipped {raw}: {e}");
                return false;
            }
        };
        let request = Request::get(url, Destination::Empty);
        match ctx.network.fetch(&request).await {
            Ok(response) if response.status == 200 => match ctx.caches.put(cache, &request.key(), &response).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("CACHE_URLS could not store {}: {e}", request.url);
                    false
                }
            },
            Ok(response) => {
                tracing::debug!("CACHE_URLS {} returned {}", request.url, response.status);
                false
            }
            Err(e) => {
                tracing::warn!("CACHE_URLS fetch failed: {e}");
                false
            }
        }
    }))
    .await;

    let stored = results.iter().filter(|ok| **ok).count();
    let report = CacheUrlsReport { stored, failed: results.len() - stored };
    tracing::info!("CACHE_URLS stored {} of {} urls", report.stored, results.len());
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedNetwork, config, ok, url};
    use shelter_core::{MemoryCacheStore, NamedCacheStore, RequestKey, ResponseSnapshot};
    use std::sync::Arc;

    #[test]
    fn test_parse_messages() {
        let skip = serde_json::json!({"type": "SKIP_WAITING"});
        assert_eq!(ControlMessage::parse(&skip), Some(ControlMessage::SkipWaiting));

        let cache = serde_json::json!({"type": "CACHE_URLS", "urls": ["/a.html"]});
        assert_eq!(ControlMessage::parse(&cache), Some(ControlMessage::CacheUrls { urls: vec!["/a.html".into()] }));

        assert_eq!(ControlMessage::parse(&serde_json::json!({"type": "PING"})), None);
        assert_eq!(ControlMessage::parse(&serde_json::json!("SKIP_WAITING")), None);
    }

    #[tokio::test]
    async fn test_cache_urls_stores_only_successes() {
        let network = Arc::new(ScriptedNetwork::new());
        network.respond(&url("/anime.html"), ok("anime"));
        network.respond(&url("/gone.html"), ResponseSnapshot::new(404, vec![], ""));
        let store = Arc::new(MemoryCacheStore::new());
        let ctx = WorkerContext::new(config(), store.clone(), network).unwrap();

        let urls = vec!["/anime.html".to_string(), "/gone.html".to_string(), "/offline.html".to_string()];
        let report = cache_urls(&ctx, &urls).await;

        assert_eq!(report, CacheUrlsReport { stored: 1, failed: 2 });
        assert_eq!(store.keys("runtime-v2").await.unwrap(), vec![RequestKey::get(url("/anime.html"))]);
    }
}
