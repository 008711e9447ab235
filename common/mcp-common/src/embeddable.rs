//! In-process tool execution
//!
//! [`EmbeddableMcp`] lets a host call a server's tools directly, without a
//! stdio subprocess. The host sees the same tool list and the same
//! `CallToolResult` payloads a remote client would.
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_common::EmbeddableMcp;
//! use sqlite_mcp::SqliteMcpServer;
//!
//! let server = SqliteMcpServer::in_memory()?;
//! let result = server
//!     .call_tool("sqlite_query", serde_json::json!({ "sql": "SELECT 1 AS one" }))
//!     .await?;
//! ```

use async_trait::async_trait;
use rmcp::model::{CallToolResult, Tool};
use serde_json::Value;

/// Failures that prevent a call from producing any tool result
///
/// Tool-level failures (bad identifiers, missing rows, SQL errors) are not
/// represented here; they come back inside the `CallToolResult`.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddableError {
    /// No tool with this name is registered
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// The result could not be produced by the protocol layer
    #[error("mcp error: {0}")]
    McpError(String),
}

impl From<rmcp::ErrorData> for EmbeddableError {
    fn from(err: rmcp::ErrorData) -> Self {
        EmbeddableError::McpError(err.message.to_string())
    }
}

/// Result type for embeddable MCP operations
pub type EmbeddableResult<T> = Result<T, EmbeddableError>;

/// An MCP server that can be driven in-process
///
/// Implementations are `Send + Sync`; concurrent calls are allowed and the
/// server is responsible for serializing access to shared resources.
#[async_trait]
pub trait EmbeddableMcp: Send + Sync {
    /// Name used for this server in MCP configuration files
    fn server_name(&self) -> &str;

    /// Every tool with its name, description and input schema
    fn list_tools(&self) -> Vec<Tool>;

    /// Run the tool `name` with a JSON object of arguments
    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult>;

    fn server_description(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoServer;

    #[async_trait]
    impl EmbeddableMcp for EchoServer {
        fn server_name(&self) -> &str {
            "echo"
        }

        fn list_tools(&self) -> Vec<Tool> {
            vec![]
        }

        async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
            match name {
                "echo" => Ok(CallToolResult::success(vec![rmcp::model::Content::text(
                    params.to_string(),
                )])),
                _ => Err(EmbeddableError::ToolNotFound(name.to_string())),
            }
        }
    }

    #[test]
    fn test_defaults() {
        let server = EchoServer;
        assert_eq!(server.server_name(), "echo");
        assert!(server.server_description().is_none());
        assert!(server.list_tools().is_empty());
    }

    #[tokio::test]
    async fn test_call_known_tool() {
        let result = EchoServer
            .call_tool("echo", serde_json::json!({"a": 1}))
            .await
            .unwrap();
        assert_eq!(result.content.len(), 1);
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let result = EchoServer.call_tool("nope", serde_json::json!({})).await;
        assert!(matches!(result, Err(EmbeddableError::ToolNotFound(name)) if name == "nope"));
    }

    #[test]
    fn test_from_error_data() {
        let err: EmbeddableError = rmcp::ErrorData::internal_error("boom", None).into();
        assert!(err.to_string().contains("boom"));
    }
}
