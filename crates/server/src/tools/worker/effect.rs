//! JSON rendering of worker effects.

use schemars::JsonSchema;
use serde::Serialize;
use shelter_client::worker::{CacheUrlsReport, ClickOutcome, PushNotification};
use shelter_client::{ActivationReport, Effect, InstallReport, ResourceKind, ResponseSource, Served};

/// A response produced by the worker, with the body decoded as text.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ResponseOutput {
    pub status: u16,
    pub source: ResponseSource,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    /// A background refresh of the cached copy is in flight.
    pub revalidating: bool,
}

impl From<Served> for ResponseOutput {
    fn from(served: Served) -> Self {
        let response = served.response;
        Self {
            status: response.status,
            source: served.source,
            content_type: response.content_type().map(str::to_string),
            body: String::from_utf8_lossy(&response.body).into_owned(),
            headers: response.headers,
            revalidating: served.revalidation.is_some(),
        }
    }
}

/// What a worker did with an event.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum EffectOutput {
    Installed { report: InstallReport, skip_waiting: bool },
    InstallFailed { error: String },
    Activated { report: ActivationReport },
    Respond { kind: ResourceKind, response: ResponseOutput },
    PassThrough,
    SkipWaiting,
    CachedUrls { report: CacheUrlsReport },
    Synced { handled: bool },
    ShowNotification { notification: PushNotification },
    NotificationClicked { outcome: ClickOutcome },
    NoWorker,
}

impl From<Effect> for EffectOutput {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Installed { report, skip_waiting } => Self::Installed { report, skip_waiting },
            Effect::InstallFailed(e) => Self::InstallFailed { error: e.to_string() },
            Effect::Activated(report) => Self::Activated { report },
            Effect::Respond { kind, served } => Self::Respond { kind, response: served.into() },
            Effect::PassThrough => Self::PassThrough,
            Effect::SkipWaiting => Self::SkipWaiting,
            Effect::CachedUrls(report) => Self::CachedUrls { report },
            Effect::Synced { handled } => Self::Synced { handled },
            Effect::ShowNotification(notification) => Self::ShowNotification { notification },
            Effect::NotificationClicked(outcome) => Self::NotificationClicked { outcome },
            Effect::NoWorker => Self::NoWorker,
        }
    }
}
