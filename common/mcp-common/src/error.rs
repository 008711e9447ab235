//! Error handling utilities for MCP servers
//!
//! Tool failures are reported to the calling agent as structured data
//! rather than protocol errors. Domain error types implement [`ToolError`]
//! so the envelope can carry a stable, machine-readable `kind` next to the
//! human-readable message.

use rmcp::ErrorData as McpError;

/// Type alias for MCP tool results
pub type McpResult<T> = Result<T, McpError>;

/// A tool-level failure with a stable kind identifier
///
/// `kind` must be a short snake_case string that never changes for a given
/// variant; agents branch on it. The `Display` impl supplies the message.
///
/// # Example
///
/// ```rust,ignore
/// use mcp_common::ToolError;
///
/// #[derive(Debug, thiserror::Error)]
/// enum LookupError {
///     #[error("no such key: {0}")]
///     Missing(String),
/// }
///
/// impl ToolError for LookupError {
///     fn kind(&self) -> &'static str {
///         match self {
///             LookupError::Missing(_) => "not_found",
///         }
///     }
/// }
/// ```
pub trait ToolError: std::error::Error {
    /// Stable identifier for this failure class
    fn kind(&self) -> &'static str;
}

/// Create an internal (protocol-level) error with a message
///
/// Reserved for failures of the server itself, such as a response that
/// cannot be serialized. Tool failures belong in the envelope instead.
pub fn internal_error(message: impl Into<String>) -> McpError {
    McpError::internal_error(message.into(), None)
}
