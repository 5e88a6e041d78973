//! worker_fetch tool implementation.
//!
//! Sends a request through the active worker exactly as a page would.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelter_core::{Destination, Error, Request};

use super::effect::EffectOutput;
use crate::state::AppState;
use crate::tools::json_result;

/// Parameters for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Absolute or root-relative URL.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination: "image", "document", "script", "style" or anything else.
    #[serde(default)]
    pub destination: String,

    /// Wait for a background revalidation to finish before returning.
    #[serde(default)]
    pub await_revalidation: bool,
}

fn default_method() -> String {
    "GET".into()
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl(state: &AppState, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let request =
        Request::get(params.url.trim(), Destination::parse(&params.destination)).with_method(params.method.trim());

    let mut effect = state.registration.fetch(request).await;

    if params.await_revalidation
        && let shelter_client::Effect::Respond { served, .. } = &mut effect
        && let Some(handle) = served.revalidation.take()
        && let Err(e) = handle.await
    {
        tracing::warn!("revalidation task failed: {e}");
    }

    json_result(&EffectOutput::from(effect))
}
