//! cache_purge tool implementation.
//!
//! Deletes a single entry, a whole cache, or every cache outside the
//! configured generation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelter_core::{CacheConfiguration, CacheDb, Error, NamedCacheStore};

use super::cache_key;
use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Cache to purge from (or delete entirely when `url` is absent).
    pub cache: Option<String>,

    /// Delete only this entry of `cache`; absolute or root-relative.
    pub url: Option<String>,

    /// Delete every cache outside the configured generation.
    #[serde(default)]
    pub stale: bool,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of caches or entries deleted.
    pub deleted: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(
    cache: &CacheDb, generation: &CacheConfiguration, params: CachePurgeParams,
) -> Result<CallToolResult, McpError> {
    if params.cache.is_none() && !params.stale {
        return Err(Error::InvalidInput("Either cache or stale must be specified".to_string()).into());
    }
    if params.url.is_some() && params.cache.is_none() {
        return Err(Error::InvalidInput("url requires cache".to_string()).into());
    }

    let mut deleted_total = 0u64;

    match (params.cache.as_deref(), params.url.as_deref()) {
        (Some(name), Some(url)) => {
            if cache.delete(name, &cache_key(&generation.origin, url)?).await? {
                deleted_total += 1;
            }
        }
        (Some(name), None) => {
            if cache.delete_cache(name).await? {
                deleted_total += 1;
            }
        }
        _ => {}
    }

    if params.stale {
        for name in cache.cache_names().await? {
            if !generation.is_current(&name) && cache.delete_cache(&name).await? {
                deleted_total += 1;
            }
        }
    }

    json_result(&CachePurgeOutput { deleted: deleted_total })
}
