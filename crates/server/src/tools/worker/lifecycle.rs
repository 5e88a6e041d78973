//! worker_install and worker_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelter_client::{ActivationReport, DeployOutcome, WorkerState};

use crate::state::AppState;
use crate::tools::json_result;

/// Parameters for the worker_install tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct WorkerInstallParams {
    /// Core cache name of the new version (default: the configured one).
    #[serde(default)]
    pub cache_version: Option<String>,
}

/// Output from the worker_install tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct WorkerInstallOutput {
    pub version: String,
    pub state: WorkerState,
    pub outcome: DeployOutcome,
}

/// Implementation of the worker_install tool.
pub async fn install_impl(state: &AppState, params: WorkerInstallParams) -> Result<CallToolResult, McpError> {
    let worker = state.worker(params.cache_version.as_deref())?;
    let outcome = state.registration.deploy(worker.clone()).await?;

    json_result(&WorkerInstallOutput { version: worker.version().to_string(), state: worker.state(), outcome })
}

/// Output from the worker_activate tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct WorkerActivateOutput {
    /// Whether a waiting worker was promoted.
    pub activated: bool,
    /// Version now serving, if any.
    pub active: Option<String>,
    pub report: Option<ActivationReport>,
}

/// Implementation of the worker_activate tool.
pub async fn activate_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let report = state.registration.skip_waiting().await;
    let active = state.registration.active().await.map(|w| w.version().to_string());

    json_result(&WorkerActivateOutput { activated: report.is_some(), active, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{output, state};

    #[tokio::test]
    async fn test_install_then_stage_update() {
        let (state, _) = state().await;

        let result = install_impl(&state, WorkerInstallParams::default()).await.unwrap();
        let value = output(&result);
        assert_eq!(value["state"], "active");
        assert_eq!(value["outcome"]["outcome"], "activated");
        assert_eq!(value["outcome"]["install"]["cached"], 2);

        let params = WorkerInstallParams { cache_version: Some("absolute-v3.0.0".into()) };
        let value = output(&install_impl(&state, params).await.unwrap());
        assert_eq!(value["version"], "absolute-v3.0.0");
        assert_eq!(value["state"], "active");
        assert_eq!(value["outcome"]["activation"]["deleted"][0], "absolute-v2.0.0");
    }

    #[tokio::test]
    async fn test_install_failure_is_reported() {
        let (state, network) = state().await;
        network.routes.lock().unwrap().clear();

        let err = install_impl(&state, WorkerInstallParams::default()).await.unwrap_err();
        assert!(err.message.starts_with("MANIFEST_FETCH_FAILED"));
        assert!(state.registration.active().await.is_none());
    }

    #[tokio::test]
    async fn test_activate_without_waiting_worker() {
        let (state, _) = state().await;
        state.bootstrap().await.unwrap();

        let value = output(&activate_impl(&state).await.unwrap());

        assert_eq!(value["activated"], false);
        assert_eq!(value["active"], "absolute-v2.0.0");
        assert!(value["report"].is_null());
    }
}
