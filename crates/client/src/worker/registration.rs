//! Which worker version serves.
//!
//! A registration holds at most one active and one waiting worker. A newly
//! deployed version installs, then either waits for the active one to go away
//! or takes over immediately when it asked to skip waiting.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use super::{ActivationReport, ControlMessage, Effect, InstallReport, ServiceWorker, WorkerEvent, WorkerState};
use shelter_core::{Error, Request};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum DeployOutcome {
    Activated { install: InstallReport, activation: ActivationReport },
    Waiting { install: InstallReport },
}

#[derive(Debug, Default)]
pub struct Registration {
    active: RwLock<Option<Arc<ServiceWorker>>>,
    waiting: RwLock<Option<Arc<ServiceWorker>>>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn active(&self) -> Option<Arc<ServiceWorker>> {
        self.active.read().await.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<ServiceWorker>> {
        self.waiting.read().await.clone()
    }

    /// Install a new version.
    ///
    /// On failure the version is marked failed and whatever was active keeps
    /// serving. On success it activates right away when there is no active
    /// worker or it asked to skip waiting; otherwise it waits.
    pub async fn deploy(&self, worker: Arc<ServiceWorker>) -> Result<DeployOutcome, Error> {
        let install = match worker.handle(WorkerEvent::Install).await {
            Effect::Installed { report, .. } => report,
            Effect::InstallFailed(e) => {
                tracing::error!("worker {} failed to install: {e}", worker.version());
                return Err(e);
            }
            other => return Err(Error::InvalidInput(format!("unexpected install outcome: {other:?}"))),
        };

        let takes_over = worker.skip_waiting_requested() || self.active.read().await.is_none();
        if takes_over {
            let activation = self.promote(worker).await;
            return Ok(DeployOutcome::Activated { install, activation });
        }

        tracing::info!("worker {} installed and waiting", worker.version());
        if let Some(previous) = self.waiting.write().await.replace(worker) {
            previous.set_state(WorkerState::Superseded);
        }
        Ok(DeployOutcome::Waiting { install })
    }

    /// Promote the waiting worker, if any.
    pub async fn skip_waiting(&self) -> Option<ActivationReport> {
        let waiting = self.waiting.write().await.take()?;
        Some(self.promote(waiting).await)
    }

    async fn promote(&self, worker: Arc<ServiceWorker>) -> ActivationReport {
        {
            let mut active = self.active.write().await;
            if let Some(previous) = active.replace(worker.clone()) {
                previous.set_state(WorkerState::Superseded);
                tracing::info!("worker {} superseded by {}", previous.version(), worker.version());
            }
        }

        let displaced = self.waiting.write().await.take();
        if let Some(older) = displaced.filter(|w| !Arc::ptr_eq(w, &worker)) {
            older.set_state(WorkerState::Superseded);
            tracing::info!("waiting worker {} made redundant by {}", older.version(), worker.version());
        }

        match worker.handle(WorkerEvent::Activate).await {
            Effect::Activated(report) => report,
            _ => ActivationReport::default(),
        }
    }

    /// Route a request to the active worker; with none it goes to the network.
    pub async fn fetch(&self, request: Request) -> Effect {
        match self.active().await {
            Some(worker) => worker.handle(WorkerEvent::Fetch(request)).await,
            None => Effect::PassThrough,
        }
    }

    /// Deliver a control message.
    ///
    /// `SKIP_WAITING` goes to the waiting worker and promotes it; everything
    /// else goes to the active worker.
    pub async fn post_message(&self, message: ControlMessage) -> Effect {
        if message == ControlMessage::SkipWaiting {
            let Some(waiting) = self.waiting().await else {
                return Effect::NoWorker;
            };
            waiting.handle(WorkerEvent::Message(message)).await;
            return match self.skip_waiting().await {
                Some(report) => Effect::Activated(report),
                None => Effect::NoWorker,
            };
        }
        self.dispatch(WorkerEvent::Message(message)).await
    }

    /// Deliver any other event to the active worker.
    pub async fn dispatch(&self, event: WorkerEvent) -> Effect {
        match self.active().await {
            Some(worker) => worker.handle(event).await,
            None => Effect::NoWorker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedNetwork, config, ok, url};
    use crate::worker::ResourceKind;
    use shelter_core::{CacheConfiguration, Destination, MemoryCacheStore, NamedCacheStore};

    fn network() -> Arc<ScriptedNetwork> {
        let network = Arc::new(ScriptedNetwork::new());
        network.respond(&url("/a.js"), ok("a"));
        network.respond(&url("/b.css"), ok("b"));
        network
    }

    fn worker(config: CacheConfiguration, store: Arc<MemoryCacheStore>, network: Arc<ScriptedNetwork>) -> Arc<ServiceWorker> {
        Arc::new(ServiceWorker::new(config, store, network).unwrap())
    }

    #[tokio::test]
    async fn test_first_deploy_activates() {
        let registration = Registration::new();
        let store = Arc::new(MemoryCacheStore::new());
        let v2 = worker(CacheConfiguration { skip_waiting_on_install: false, ..config() }, store, network());

        let outcome = registration.deploy(v2.clone()).await.unwrap();

        assert!(matches!(outcome, DeployOutcome::Activated { .. }));
        assert_eq!(v2.state(), WorkerState::Active);
        assert!(registration.waiting().await.is_none());
    }

    #[tokio::test]
    async fn test_update_waits_until_skip_waiting() {
        let registration = Registration::new();
        let store = Arc::new(MemoryCacheStore::new());
        let network = network();
        let v1 = worker(config(), store.clone(), network.clone());
        registration.deploy(v1.clone()).await.unwrap();

        let v3_config = CacheConfiguration { core_cache: "core-v3".into(), skip_waiting_on_install: false, ..config() };
        let v3 = worker(v3_config, store.clone(), network);
        let outcome = registration.deploy(v3.clone()).await.unwrap();

        assert!(matches!(outcome, DeployOutcome::Waiting { .. }));
        assert_eq!(v3.state(), WorkerState::Waiting);
        assert_eq!(v1.state(), WorkerState::Active);

        let effect = registration.post_message(ControlMessage::SkipWaiting).await;
        let Effect::Activated(report) = effect else { panic!("expected activation") };

        assert_eq!(report.deleted, vec!["core-v2".to_string()]);
        assert_eq!(v1.state(), WorkerState::Superseded);
        assert_eq!(v3.state(), WorkerState::Active);
        assert_eq!(registration.active().await.unwrap().version(), "core-v3");
        assert!(!store.cache_names().await.unwrap().contains(&"core-v2".to_string()));
    }

    #[tokio::test]
    async fn test_skip_waiting_on_install_takes_over() {
        let registration = Registration::new();
        let store = Arc::new(MemoryCacheStore::new());
        let v1 = worker(config(), store.clone(), network());
        registration.deploy(v1.clone()).await.unwrap();

        let v3 = worker(CacheConfiguration { core_cache: "core-v3".into(), ..config() }, store, network());
        let outcome = registration.deploy(v3.clone()).await.unwrap();

        assert!(matches!(outcome, DeployOutcome::Activated { .. }));
        assert_eq!(v1.state(), WorkerState::Superseded);
        assert_eq!(v3.state(), WorkerState::Active);
    }

    #[tokio::test]
    async fn test_takeover_discards_older_waiting_worker() {
        let registration = Registration::new();
        let store = Arc::new(MemoryCacheStore::new());
        let network = network();
        let v2 = worker(config(), store.clone(), network.clone());
        registration.deploy(v2.clone()).await.unwrap();

        let v3_config = CacheConfiguration { core_cache: "core-v3".into(), skip_waiting_on_install: false, ..config() };
        let v3 = worker(v3_config, store.clone(), network.clone());
        registration.deploy(v3.clone()).await.unwrap();
        assert_eq!(v3.state(), WorkerState::Waiting);

        let v4 = worker(CacheConfiguration { core_cache: "core-v4".into(), ..config() }, store.clone(), network);
        registration.deploy(v4.clone()).await.unwrap();

        assert_eq!(v4.state(), WorkerState::Active);
        assert_eq!(v3.state(), WorkerState::Superseded);
        assert!(registration.waiting().await.is_none());

        assert!(matches!(registration.post_message(ControlMessage::SkipWaiting).await, Effect::NoWorker));
        assert_eq!(registration.active().await.unwrap().version(), "core-v4");
        assert_eq!(v4.state(), WorkerState::Active);
        assert!(store.cache_names().await.unwrap().contains(&"core-v4".to_string()));
    }

    #[tokio::test]
    async fn test_failed_update_keeps_previous_active() {
        let registration = Registration::new();
        let store = Arc::new(MemoryCacheStore::new());
        let v1 = worker(config(), store.clone(), network());
        registration.deploy(v1.clone()).await.unwrap();

        let broken = CacheConfiguration { core_cache: "core-v3".into(), manifest: vec!["/missing.js".into()], ..config() };
        let v3 = worker(broken, store.clone(), network());

        assert!(matches!(registration.deploy(v3.clone()).await, Err(Error::ManifestFetch(_))));
        assert_eq!(v3.state(), WorkerState::Failed);
        assert_eq!(v1.state(), WorkerState::Active);
        assert_eq!(registration.active().await.unwrap().version(), "core-v2");
    }

    #[tokio::test]
    async fn test_fetch_without_active_worker_passes_through() {
        let registration = Registration::new();
        let effect = registration.fetch(Request::get(url("/index.html"), Destination::Document)).await;
        assert!(matches!(effect, Effect::PassThrough));
        assert!(matches!(registration.post_message(ControlMessage::SkipWaiting).await, Effect::NoWorker));
        assert!(matches!(registration.dispatch(WorkerEvent::Sync { tag: "sync-data".into() }).await, Effect::NoWorker));
    }

    #[tokio::test]
    async fn test_fetch_goes_to_active_worker() {
        let registration = Registration::new();
        let network = network();
        network.respond(&url("/index.html"), ok("home"));
        registration.deploy(worker(config(), Arc::new(MemoryCacheStore::new()), network)).await.unwrap();

        let effect = registration.fetch(Request::get(url("/index.html"), Destination::Document)).await;

        let Effect::Respond { kind, served } = effect else { panic!("expected a response") };
        assert_eq!(kind, ResourceKind::Document);
        assert_eq!(served.response.body, "home");
    }
}
