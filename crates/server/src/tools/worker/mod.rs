//! Worker MCP tools.
//!
//! Drive the offline-caching worker: deploy versions, promote waiting ones,
//! send requests through it and deliver messages and events.

pub mod effect;
pub mod fetch;
pub mod lifecycle;
pub mod message;

pub use fetch::{WorkerFetchParams, fetch_impl};
pub use lifecycle::{WorkerInstallParams, activate_impl, install_impl};
pub use message::{WorkerEventParams, WorkerMessageParams, event_impl, message_impl};
