//! cache_get tool implementation.
//!
//! Retrieves a cached response by URL, from one named cache or from all of
//! them in creation order.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelter_core::{CacheConfiguration, CacheDb, Error, NamedCacheStore};

use super::cache_key;
use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// URL of the cached GET request, absolute or root-relative.
    pub url: String,

    /// Only look in this cache (default: search every cache).
    #[serde(default)]
    pub cache: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub size: usize,
    /// Store-level key of the entry.
    pub hash: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(
    cache: &CacheDb, generation: &CacheConfiguration, params: CacheGetParams,
) -> Result<CallToolResult, McpError> {
    let key = cache_key(&generation.origin, &params.url)?;

    let found = match params.cache.as_deref() {
        Some(name) => cache.get(name, &key).await?,
        None => cache.match_any(&key).await?,
    };
    let response = found.ok_or_else(|| Error::CacheMiss(key.to_string()))?;

    json_result(&CacheGetOutput {
        hash: key.hash(),
        url: key.url,
        status: response.status,
        body: String::from_utf8_lossy(&response.body).into_owned(),
        size: response.body.len(),
        headers: response.headers,
    })
}
