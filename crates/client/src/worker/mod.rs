//! The offline-caching worker.
//!
//! A [`ServiceWorker`] is one version of the worker bound to one cache
//! generation. It reacts to [`WorkerEvent`]s and reports what happened as an
//! [`Effect`]. [`Registration`] decides which version is installed, waiting or
//! active.

pub mod hooks;
pub mod lifecycle;
pub mod messages;
pub mod registration;
pub mod router;
pub mod strategies;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::fetch::{Network, resolve};
pub use hooks::{ClickOutcome, PushNotification};
pub use lifecycle::{ActivationReport, CacheRegistry, InstallReport, WorkerState};
pub use messages::{CacheUrlsReport, ControlMessage};
pub use registration::{DeployOutcome, Registration};
pub use router::{RequestRouter, ResourceKind, Route};
pub use strategies::{ResponseSource, Served, WorkerContext};
use shelter_core::{CacheConfiguration, Error, NamedCacheStore, Request};

/// Something the worker is asked to handle.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Message(ControlMessage),
    Sync { tag: String },
    Push { payload: Option<String> },
    NotificationClick { action: Option<String> },
}

/// What handling an event produced.
#[derive(Debug)]
pub enum Effect {
    Installed { report: InstallReport, skip_waiting: bool },
    InstallFailed(Error),
    Activated(ActivationReport),
    Respond { kind: ResourceKind, served: Served },
    /// The request is not intercepted and goes to the network unchanged.
    PassThrough,
    SkipWaiting,
    CachedUrls(CacheUrlsReport),
    Synced { handled: bool },
    ShowNotification(PushNotification),
    NotificationClicked(ClickOutcome),
    /// No worker was in a state to receive the event.
    NoWorker,
}

pub struct ServiceWorker {
    ctx: WorkerContext,
    router: RequestRouter,
    registry: CacheRegistry,
    state: watch::Sender<WorkerState>,
    skip_waiting: AtomicBool,
}

impl ServiceWorker {
    pub fn new(
        config: CacheConfiguration, caches: Arc<dyn NamedCacheStore>, network: Arc<dyn Network>,
    ) -> Result<Self, Error> {
        let router = RequestRouter::new(&config)?;
        let ctx = WorkerContext::new(config, caches, network)?;
        Ok(Self {
            registry: CacheRegistry::new(ctx.clone()),
            ctx,
            router,
            state: watch::Sender::new(WorkerState::Installing),
            skip_waiting: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &CacheConfiguration {
        &self.ctx.config
    }

    /// Name of the core cache, which identifies this version.
    pub fn version(&self) -> &str {
        &self.ctx.config.core_cache
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Receiver that observes every state transition.
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    pub(crate) fn set_state(&self, next: WorkerState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::debug!("worker {} {:?} -> {:?}", self.version(), previous, next);
        }
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub async fn handle(&self, event: WorkerEvent) -> Effect {
        match event {
            WorkerEvent::Install => self.install().await,
            WorkerEvent::Activate => {
                let report = self.registry.activate().await;
                self.set_state(WorkerState::Active);
                Effect::Activated(report)
            }
            WorkerEvent::Fetch(request) => self.fetch(request).await,
            WorkerEvent::Message(ControlMessage::SkipWaiting) => {
                self.skip_waiting.store(true, Ordering::SeqCst);
                Effect::SkipWaiting
            }
            WorkerEvent::Message(ControlMessage::CacheUrls { urls }) => {
                Effect::CachedUrls(messages::cache_urls(&self.ctx, &urls).await)
            }
            WorkerEvent::Sync { tag } => Effect::Synced { handled: hooks::sync(&tag).await },
            WorkerEvent::Push { payload } => {
                Effect::ShowNotification(PushNotification::from_push(&self.ctx.config.app_name, payload.as_deref()))
            }
            WorkerEvent::NotificationClick { action } => {
                Effect::NotificationClicked(hooks::notification_click(action.as_deref()))
            }
        }
    }

    async fn install(&self) -> Effect {
        self.set_state(WorkerState::Installing);
        match self.registry.install().await {
            Ok(report) => {
                if self.ctx.config.skip_waiting_on_install {
                    self.skip_waiting.store(true, Ordering::SeqCst);
                }
                self.set_state(WorkerState::Waiting);
                Effect::Installed { report, skip_waiting: self.skip_waiting_requested() }
            }
            Err(e) => {
                self.set_state(WorkerState::Failed);
                Effect::InstallFailed(e)
            }
        }
    }

    /// Only an active worker intercepts requests.
    async fn fetch(&self, mut request: Request) -> Effect {
        if self.state() != WorkerState::Active {
            return Effect::PassThrough;
        }

        match resolve(self.ctx.origin(), &request.url) {
            Ok(url) => request.url = url.into(),
            Err(e) => {
                tracing::debug!("not intercepting {}: {e}", request.url);
                return Effect::PassThrough;
            }
        }

        let kind = match self.router.classify(&request) {
            Route::PassThrough => return Effect::PassThrough,
            Route::Intercept(kind) => kind,
        };

        let served = match kind {
            ResourceKind::Image => strategies::cache_first_with_eviction(&self.ctx, &request).await,
            ResourceKind::Document => strategies::network_first_with_fallback(&self.ctx, &request).await,
            ResourceKind::ScriptOrStyle => strategies::stale_while_revalidate(&self.ctx, &request).await,
            ResourceKind::Other => strategies::network_with_cache_fallback(&self.ctx, &request).await,
        };
        tracing::debug!("{} {} served from {:?}", request.method, request.url, served.source);
        Effect::Respond { kind, served }
    }
}

impl std::fmt::Debug for ServiceWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceWorker")
            .field("version", &self.version())
            .field("state", &self.state())
            .finish()
    }
}
