//! Background sync, push and notification-click handlers.
//!
//! Sync only logs; push only builds the notification to show.

use serde::Serialize;

/// Sync tag that triggers the data-sync routine.
pub const SYNC_TAG: &str = "sync-data";

pub const DEFAULT_PUSH_BODY: &str = "New content available!";

const NOTIFICATION_ICON: &str = "/img/assets/loadinglogo.png";
const NOTIFICATION_BADGE: &str = "/img/assets/favicon.ico";

/// Returns `true` when the tag was handled.
pub async fn sync(tag: &str) -> bool {
    if tag != SYNC_TAG {
        tracing::debug!("ignoring sync tag {tag}");
        return false;
    }
    tracing::info!("syncing data");
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct NotificationData {
    /// Milliseconds since the Unix epoch.
    pub date_of_arrival: i64,
    pub primary_key: u32,
}

/// A notification to display in response to a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

impl PushNotification {
    /// Build the notification for a push with an optional text payload.
    pub fn from_push(app_name: &str, payload: Option<&str>) -> Self {
        let action = |action: &str, title: &str| NotificationAction {
            action: action.into(),
            title: title.into(),
            icon: NOTIFICATION_BADGE.into(),
        };
        Self {
            title: app_name.to_string(),
            body: payload.unwrap_or(DEFAULT_PUSH_BODY).to_string(),
            icon: NOTIFICATION_ICON.into(),
            badge: NOTIFICATION_BADGE.into(),
            vibrate: vec![200, 100, 200],
            data: NotificationData { date_of_arrival: chrono::Utc::now().timestamp_millis(), primary_key: 1 },
            actions: vec![action("explore", "View now"), action("close", "Close")],
        }
    }
}

/// What a notification click leads to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct ClickOutcome {
    pub closed: bool,
    /// Window to open, if any.
    pub open_window: Option<String>,
}

pub fn notification_click(action: Option<&str>) -> ClickOutcome {
    ClickOutcome { closed: true, open_window: (action == Some("explore")).then(|| "/".to_string()) }
}
