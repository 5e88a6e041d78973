//! worker_message and worker_event tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelter_client::{ControlMessage, WorkerEvent};

use super::effect::EffectOutput;
use crate::error::ToolError;
use crate::state::AppState;
use crate::tools::json_result;

/// Parameters for the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// The posted message, e.g. `{"type": "SKIP_WAITING"}` or
    /// `{"type": "CACHE_URLS", "urls": ["/anime.html"]}`.
    pub message: serde_json::Value,
}

/// Implementation of the worker_message tool.
pub async fn message_impl(state: &AppState, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let message = ControlMessage::parse(&params.message)
        .ok_or_else(|| ToolError::InvalidInput(format!("unrecognized message: {}", params.message)))?;

    let effect = state.registration.post_message(message).await;
    json_result(&EffectOutput::from(effect))
}

/// Parameters for the worker_event tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerEventParams {
    /// One of "sync", "push", "notification_click".
    pub event: String,

    /// Sync tag (sync only).
    #[serde(default)]
    pub tag: Option<String>,

    /// Push payload text (push only).
    #[serde(default)]
    pub payload: Option<String>,

    /// Clicked action (notification_click only).
    #[serde(default)]
    pub action: Option<String>,
}

/// Implementation of the worker_event tool.
pub async fn event_impl(state: &AppState, params: WorkerEventParams) -> Result<CallToolResult, McpError> {
    let event = match params.event.as_str() {
        "sync" => {
            let tag = params.tag.ok_or_else(|| ToolError::InvalidInput("sync requires a tag".into()))?;
            WorkerEvent::Sync { tag }
        }
        "push" => WorkerEvent::Push { payload: params.payload },
        "notification_click" => WorkerEvent::NotificationClick { action: params.action },
        other => return Err(ToolError::UnknownAction { tool: "worker_event", action: other.to_string() }.into()),
    };

    let effect = state.registration.dispatch(event).await;
    json_result(&EffectOutput::from(effect))
}
