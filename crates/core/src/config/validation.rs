//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) URL
    /// - a cache name is empty, or two cache names collide
    /// - `max_image_entries` is 0
    /// - a manifest entry or `fallback_document` is not root-relative
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let origin = url::Url::parse(&self.origin).map_err(|e| invalid("origin", e.to_string()))?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(invalid("origin", format!("unsupported scheme: {}", origin.scheme())));
        }

        for (field, name) in
            [("cache_version", &self.cache_version), ("runtime_cache", &self.runtime_cache), ("image_cache", &self.image_cache)]
        {
            if name.trim().is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
        }
        if self.cache_version == self.runtime_cache
            || self.cache_version == self.image_cache
            || self.runtime_cache == self.image_cache
        {
            return Err(invalid("cache_version", "core, runtime and image cache names must be distinct"));
        }

        if self.max_image_entries == 0 {
            return Err(invalid("max_image_entries", "must be greater than 0"));
        }

        if let Some(path) = self.manifest.iter().find(|p| !root_relative(p)) {
            return Err(invalid("manifest", format!("entry must be root-relative: {path}")));
        }
        if !root_relative(&self.fallback_document) {
            return Err(invalid("fallback_document", "must be root-relative"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.manifest.is_empty() {
            tracing::warn!("manifest is empty; install will cache nothing");
        }

        Ok(())
    }
}

/// `/path`, but not the protocol-relative `//host/path`.
fn root_relative(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//")
}
