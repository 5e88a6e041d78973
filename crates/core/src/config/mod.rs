//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELTER_*)
//! 2. TOML config file (if SHELTER_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The worker itself never reads `AppConfig`; it is handed a
//! [`CacheConfiguration`] derived from it at startup.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Core files that must be cached for the site to work offline.
pub const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/anime.html",
    "/projetos.html",
    "/style.css",
    "/styledn.css",
    "/css/improvements.css",
    "/data.js",
    "/postDate1.js",
    "/js/utils.js",
    "/js/loading.js",
    "/js/header.js",
    "/js/footer.js",
    "/js/search.js",
    "/js/menuHam.js",
    "/js/favorites.js",
    "/js/theme-toggle.js",
    "/img/assets/loadinglogo.png",
    "/img/assets/favicon.ico",
    "/img/assets/absolute-logo-small.png",
];

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELTER_*)
/// 2. TOML config file (if SHELTER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding named caches and preferences.
    ///
    /// Set via SHELTER_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the worker serves; other origins pass through untouched.
    ///
    /// Set via SHELTER_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Name of the core-assets cache. Bumping it starts a new generation.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Name of the runtime (documents, CACHE_URLS) cache.
    #[serde(default = "default_runtime_cache")]
    pub runtime_cache: String,

    /// Name of the images cache.
    #[serde(default = "default_image_cache")]
    pub image_cache: String,

    /// Maximum number of entries kept in the images cache.
    ///
    /// Set via SHELTER_MAX_IMAGE_ENTRIES environment variable.
    #[serde(default = "default_max_image_entries")]
    pub max_image_entries: usize,

    /// Root-relative paths pre-cached on install.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Path substrings that are never intercepted (analytics beacons).
    #[serde(default = "default_excluded_paths")]
    pub excluded_paths: Vec<String>,

    /// Cached page served when an offline document has no entry of its own.
    #[serde(default = "default_fallback_document")]
    pub fallback_document: String,

    /// Whether a freshly installed worker takes over without waiting.
    #[serde(default = "default_true")]
    pub skip_waiting_on_install: bool,

    /// Title used for push notifications.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// User-Agent string for network requests.
    ///
    /// Set via SHELTER_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network request timeout in milliseconds.
    ///
    /// Set via SHELTER_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes accepted per network response.
    ///
    /// Set via SHELTER_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shelter-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_cache_version() -> String {
    "absolute-v2.0.0".into()
}

fn default_runtime_cache() -> String {
    "absolute-runtime-v2".into()
}

fn default_image_cache() -> String {
    "absolute-images-v2".into()
}

fn default_max_image_entries() -> usize {
    50
}

fn default_manifest() -> Vec<String> {
    DEFAULT_MANIFEST.iter().map(|s| s.to_string()).collect()
}

fn default_excluded_paths() -> Vec<String> {
    vec!["google-analytics".into()]
}

fn default_fallback_document() -> String {
    "/index.html".into()
}

fn default_app_name() -> String {
    "Absolute Fansub".into()
}

fn default_user_agent() -> String {
    "shelter/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_version: default_cache_version(),
            runtime_cache: default_runtime_cache(),
            image_cache: default_image_cache(),
            max_image_entries: default_max_image_entries(),
            manifest: default_manifest(),
            excluded_paths: default_excluded_paths(),
            fallback_document: default_fallback_document(),
            skip_waiting_on_install: true,
            app_name: default_app_name(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

/// Everything the worker needs to know about its caches, injected at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfiguration {
    pub origin: String,
    /// Core-assets cache name; doubles as the generation tag.
    pub core_cache: String,
    pub runtime_cache: String,
    pub image_cache: String,
    pub manifest: Vec<String>,
    pub max_image_entries: usize,
    pub excluded_paths: Vec<String>,
    pub fallback_document: String,
    pub skip_waiting_on_install: bool,
    pub app_name: String,
}

impl CacheConfiguration {
    /// The three cache names that survive activation.
    pub fn current_generation(&self) -> [&str; 3] {
        [self.core_cache.as_str(), self.runtime_cache.as_str(), self.image_cache.as_str()]
    }

    pub fn is_current(&self, cache: &str) -> bool {
        self.current_generation().contains(&cache)
    }
}

impl Default for CacheConfiguration {
    fn default() -> Self {
        AppConfig::default().cache_configuration()
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The worker's view of this configuration.
    pub fn cache_configuration(&self) -> CacheConfiguration {
        CacheConfiguration {
            origin: self.origin.clone(),
            core_cache: self.cache_version.clone(),
            runtime_cache: self.runtime_cache.clone(),
            image_cache: self.image_cache.clone(),
            manifest: self.manifest.clone(),
            max_image_entries: self.max_image_entries,
            excluded_paths: self.excluded_paths.clone(),
            fallback_document: self.fallback_document.clone(),
            skip_waiting_on_install: self.skip_waiting_on_install,
            app_name: self.app_name.clone(),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELTER_`
    /// 2. TOML file from `SHELTER_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELTER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELTER_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
