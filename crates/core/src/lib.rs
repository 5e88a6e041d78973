//! Core types and shared functionality for shelter.
//!
//! This crate provides:
//! - Request/response snapshot types
//! - Named cache and key/value storage traits, with SQLite and in-memory backends
//! - Unified error types
//! - Configuration structures
//! - Favorites and theme preferences

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod prefs;
pub mod store;

pub use cache::{CacheDb, CacheSummary};
pub use config::{AppConfig, CacheConfiguration, ConfigError};
pub use error::Error;
pub use http::{Destination, Request, RequestKey, ResponseSnapshot};
pub use store::{KeyValueStore, MemoryCacheStore, MemoryKeyValueStore, NamedCacheStore};
