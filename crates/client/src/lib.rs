//! Client side of shelter.
//!
//! This crate provides the network fetch pipeline and the offline-caching
//! worker (routing, caching strategies, lifecycle, control messages) shared
//! by the server.

pub mod fetch;
pub mod worker;

#[cfg(test)]
mod testing;

pub use fetch::{FetchClient, FetchConfig, Network};
pub use worker::{
    ActivationReport, ControlMessage, DeployOutcome, Effect, InstallReport, Registration, ResourceKind, ResponseSource,
    Served, ServiceWorker, WorkerEvent, WorkerState,
};
