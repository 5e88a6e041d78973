//! Errors raised by tool argument handling in the server.
//!
//! Everything coming from the worker or the stores is a `shelter_core::Error`;
//! this type only covers malformed tool calls.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., a missing id).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The `action` argument names nothing the tool knows.
    #[error("UNKNOWN_ACTION: {tool} does not support '{action}'")]
    UnknownAction { tool: &'static str, action: String },
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match &err {
            ToolError::InvalidInput(_) => -32602,
            ToolError::UnknownAction { .. } => -32601,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
