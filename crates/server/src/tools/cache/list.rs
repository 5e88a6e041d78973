//! cache_list tool implementation.
//!
//! Lists every named cache with its entry count.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelter_core::{CacheConfiguration, CacheDb, CacheSummary};

use crate::tools::json_result;

/// One cache in the cache_list output.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListEntry {
    #[serde(flatten)]
    pub summary: CacheSummary,
    /// Whether the cache belongs to the configured generation.
    pub current: bool,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    pub caches: Vec<CacheListEntry>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(cache: &CacheDb, generation: &CacheConfiguration) -> Result<CallToolResult, McpError> {
    let caches = cache
        .cache_summaries()
        .await?
        .into_iter()
        .map(|summary| CacheListEntry { current: generation.is_current(&summary.name), summary })
        .collect();

    json_result(&CacheListOutput { caches })
}
