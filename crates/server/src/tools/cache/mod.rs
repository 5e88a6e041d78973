//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and purging the named caches.

pub mod get;
pub mod list;
pub mod purge;

pub use get::{CacheGetParams, get_impl};
pub use list::list_impl;
pub use purge::{CachePurgeParams, purge_impl};

use shelter_client::fetch::{parse_origin, resolve};
use shelter_core::RequestKey;

use crate::error::ToolError;

/// Cache key for a URL as the worker would store it: root-relative URLs are
/// resolved against `origin`.
pub(crate) fn cache_key(origin: &str, url: &str) -> Result<RequestKey, ToolError> {
    let base = parse_origin(origin).map_err(|e| ToolError::InvalidInput(format!("origin {origin}: {e}")))?;
    let resolved = resolve(&base, url).map_err(|e| ToolError::InvalidInput(format!("{url}: {e}")))?;
    Ok(RequestKey::get(resolved))
}
