//! MCP Common - Shared utilities for MCP servers
//!
//! - **Initialization**: [`init_tracing`] sets up stderr logging
//! - **Results**: [`Envelope`] wraps every tool outcome as `{ok, result | error}`
//! - **Errors**: [`ToolError`] gives domain errors a stable `kind`
//! - **Embeddable**: [`EmbeddableMcp`] for in-process execution
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_common::{Envelope, McpResult, CallToolResult};
//!
//! async fn my_tool(&self) -> McpResult<CallToolResult> {
//!     let outcome = self.do_work().await; // Result<Data, MyError: ToolError>
//!     Envelope::from_result("my_tool", outcome).into_call_result()
//! }
//! ```

pub mod embeddable;
pub mod error;
pub mod init;
pub mod result;

// Re-export commonly used items at crate root
pub use embeddable::{EmbeddableError, EmbeddableMcp, EmbeddableResult};
pub use error::{internal_error, McpResult, ToolError};
pub use init::init_tracing;
pub use result::{Envelope, ErrorBody};

// Re-export rmcp types that are commonly needed
pub use rmcp::{
    model::{CallToolResult, Content, Tool},
    ErrorData as McpError,
};

// Re-export async_trait for implementing EmbeddableMcp
pub use async_trait::async_trait;
