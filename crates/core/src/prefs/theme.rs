//! Light/dark theme preference.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{NotificationKind, Notifier};
use crate::Error;
use crate::store::KeyValueStore;

/// Storage key of the theme preference.
pub const THEME_KEY: &str = "absolute_theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    /// Browser chrome color advertised to the PWA shell.
    pub fn meta_color(self) -> &'static str {
        match self {
            Theme::Dark => "#1997d3",
            Theme::Light => "#f5f5f5",
        }
    }
}

/// Theme preference persisted under [`THEME_KEY`].
///
/// The value is stored as plain text (`dark`/`light`), not JSON, so pages
/// reading local storage directly see the same string.
pub struct ThemeStore {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
}

impl ThemeStore {
    pub fn new(store: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// The explicitly saved theme, if any.
    pub async fn saved(&self) -> Result<Option<Theme>, Error> {
        Ok(self.store.get_raw(THEME_KEY).await?.as_deref().and_then(Theme::parse))
    }

    /// Current theme; dark when nothing (valid) is saved.
    pub async fn current(&self) -> Result<Theme, Error> {
        Ok(self.saved().await?.unwrap_or_default())
    }

    pub async fn set(&self, theme: Theme) -> Result<(), Error> {
        self.store.set_raw(THEME_KEY, theme.as_str().to_string()).await
    }

    /// Switch to the other theme, persist it and notify. Returns the new theme.
    pub async fn toggle(&self) -> Result<Theme, Error> {
        let next = self.current().await?.toggled();
        self.set(next).await?;

        let message = match next {
            Theme::Dark => "Dark theme enabled",
            Theme::Light => "Light theme enabled",
        };
        self.notifier.show_notification(message, NotificationKind::Info);
        Ok(next)
    }

    /// Theme to apply on page load.
    ///
    /// A saved preference wins; otherwise the system preference decides, and
    /// without one the light theme is used.
    pub async fn initial(&self, system_prefers_dark: Option<bool>) -> Result<Theme, Error> {
        if let Some(saved) = self.saved().await? {
            return Ok(saved);
        }
        Ok(match system_prefers_dark {
            Some(true) => Theme::Dark,
            _ => Theme::Light,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::testing::RecordingNotifier;
    use crate::store::MemoryKeyValueStore;

    fn themes() -> (ThemeStore, Arc<MemoryKeyValueStore>, Arc<RecordingNotifier>) {
        let store = Arc::new(MemoryKeyValueStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        (ThemeStore::new(store.clone(), notifier.clone()), store, notifier)
    }

    #[tokio::test]
    async fn test_default_is_dark() {
        let (themes, _, _) = themes();
        assert_eq!(themes.current().await.unwrap(), Theme::Dark);
        assert!(themes.saved().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_toggle_persists_and_notifies() {
        let (themes, store, notifier) = themes();

        assert_eq!(themes.toggle().await.unwrap(), Theme::Light);
        assert_eq!(store.get_raw(THEME_KEY).await.unwrap().as_deref(), Some("light"));
        assert_eq!(themes.toggle().await.unwrap(), Theme::Dark);

        let shown = notifier.shown.lock().unwrap();
        assert_eq!(shown[0].0, "Light theme enabled");
        assert_eq!(shown[1].0, "Dark theme enabled");
    }

    #[tokio::test]
    async fn test_initial_prefers_saved_then_system() {
        let (themes, _, _) = themes();
        assert_eq!(themes.initial(Some(true)).await.unwrap(), Theme::Dark);
        assert_eq!(themes.initial(Some(false)).await.unwrap(), Theme::Light);
        assert_eq!(themes.initial(None).await.unwrap(), Theme::Light);

        themes.set(Theme::Light).await.unwrap();
        assert_eq!(themes.initial(Some(true)).await.unwrap(), Theme::Light);
    }

    #[tokio::test]
    async fn test_unknown_saved_value_falls_back() {
        let (themes, store, _) = themes();
        store.set_raw(THEME_KEY, "sepia".into()).await.unwrap();
        assert_eq!(themes.current().await.unwrap(), Theme::Dark);
    }

    #[test]
    fn test_meta_color() {
        assert_eq!(Theme::Light.meta_color(), "#f5f5f5");
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
    }
}
