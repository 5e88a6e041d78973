//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::state::AppState;
use crate::tools::{
    cache::{CacheGetParams, CachePurgeParams, get_impl, list_impl, purge_impl},
    prefs::{FavoritesParams, ThemeParams, favorites_impl, theme_impl},
    worker::{
        WorkerEventParams, WorkerFetchParams, WorkerInstallParams, WorkerMessageParams, activate_impl, event_impl,
        fetch_impl, install_impl, message_impl,
    },
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for shelter.
#[derive(Clone)]
pub struct ShelterServer {
    state: Arc<AppState>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShelterServer {
    /// Create a new server handler.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Install a worker version: fetch the manifest into its core cache (all or nothing). It takes over at once when nothing is active or it skips waiting; otherwise it waits."
    )]
    async fn worker_install(&self, params: Parameters<WorkerInstallParams>) -> Result<CallToolResult, McpError> {
        install_impl(&self.state, params.0).await
    }

    #[tool(description = "Promote the waiting worker version, deleting caches outside its generation.")]
    async fn worker_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.state).await
    }

    /// Send a request through the active worker.
    ///
    /// The worker picks a caching strategy from the request destination and reports
    /// where the response came from (network, cache, fallback, placeholder, offline).
    #[tool(
        description = "Fetch a URL through the active worker as a page would. Returns the response and where it came from."
    )]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.state, params.0).await
    }

    #[tool(description = "Post a control message (SKIP_WAITING or CACHE_URLS) to the worker.")]
    async fn worker_message(&self, params: Parameters<WorkerMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.state, params.0).await
    }

    #[tool(description = "Deliver a sync, push or notification_click event to the active worker.")]
    async fn worker_event(&self, params: Parameters<WorkerEventParams>) -> Result<CallToolResult, McpError> {
        event_impl(&self.state, params.0).await
    }

    #[tool(description = "List named caches with entry counts and whether they belong to the current generation.")]
    async fn cache_list(&self) -> Result<CallToolResult, McpError> {
        list_impl(&self.state.db, &self.state.config.cache_configuration()).await
    }

    #[tool(description = "Get a cached response by URL, from one cache or the first cache that has it.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.state.db, &self.state.config.cache_configuration(), params.0).await
    }

    #[tool(description = "Delete a cache entry, a whole cache, or every cache outside the current generation.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.state.db, &self.state.config.cache_configuration(), params.0).await
    }

    #[tool(description = "Manage favorite anime ids: list, add, remove, toggle, check, or resolve them against a catalog.")]
    async fn favorites(&self, params: Parameters<FavoritesParams>) -> Result<CallToolResult, McpError> {
        favorites_impl(&self.state.favorites, params.0).await
    }

    #[tool(description = "Get, set or toggle the dark/light theme preference, or compute the theme to apply on page load.")]
    async fn theme(&self, params: Parameters<ThemeParams>) -> Result<CallToolResult, McpError> {
        theme_impl(&self.state.themes, params.0).await
    }
}

impl ServerHandler for ShelterServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shelter".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::state;

    #[tokio::test]
    async fn test_all_tools_registered() {
        let (state, _) = state().await;
        let server = ShelterServer::new(state);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "cache_get",
                "cache_list",
                "cache_purge",
                "favorites",
                "theme",
                "worker_activate",
                "worker_event",
                "worker_fetch",
                "worker_install",
                "worker_message",
            ]
        );
    }
}
