//! SQLite-backed storage for named response caches and preferences.
//!
//! Async access goes through tokio-rusqlite. The store provides:
//!
//! - Named caches keyed by request identity (SHA-256 of method and URL)
//! - Insertion-ordered key enumeration for eviction
//! - A small key/value table for favorites and theme
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod entries;
pub mod hash;
pub mod kv;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheSummary;
