//! Storage interfaces the worker and preferences are written against.
//!
//! Both traits have an in-memory implementation here and a SQLite implementation
//! on [`CacheDb`](crate::CacheDb).

pub mod kv;
pub mod named;

pub use kv::{KeyValueStore, MemoryKeyValueStore, get_json, set_json};
pub use named::{MemoryCacheStore, NamedCacheStore};
