//! User preferences kept in key/value storage: the favorites list and the theme.
//!
//! UI feedback goes through the [`Notifier`] collaborator so the page (or any
//! other host) decides how to show it.

pub mod favorites;
pub mod theme;

use serde::{Deserialize, Serialize};

pub use favorites::{AnimeCatalog, AnimeRecord, FAVORITES_KEY, Favorites, StaticCatalog};
pub use theme::{THEME_KEY, Theme, ThemeStore};

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

/// Shows short feedback messages to the user.
pub trait Notifier: Send + Sync {
    fn show_notification(&self, message: &str, kind: NotificationKind);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_notification(&self, message: &str, kind: NotificationKind) {
        tracing::info!(?kind, "{message}");
    }
}
