//! Response envelope for MCP tool calls
//!
//! Every tool call produces exactly one [`Envelope`]:
//!
//! ```json
//! { "ok": true,  "result": { ... } }
//! { "ok": false, "error": { "kind": "not_found", "message": "...", "operation": "get_item" } }
//! ```
//!
//! Over MCP the envelope travels as the text content of a `CallToolResult`;
//! failures additionally set `is_error` so clients that ignore the body
//! still see the call failed.

use rmcp::model::{CallToolResult, Content};
use serde::{Deserialize, Serialize};

use crate::error::{internal_error, McpResult, ToolError};

/// Structured description of a failed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable failure class, see [`ToolError::kind`]
    pub kind: String,
    /// Human-readable detail, including whatever context the tool had
    pub message: String,
    /// Name of the operation that failed, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl ErrorBody {
    pub fn from_error<E: ToolError>(operation: Option<&str>, err: &E) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            operation: operation.map(str::to_string),
        }
    }
}

/// `{ok, result | error}` response wrapper
///
/// Fields are private so exactly one of `result` / `error` is ever set on
/// envelopes built by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
}

impl<T> Envelope<T> {
    pub fn success(result: T) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: ErrorBody) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error),
        }
    }

    /// Wrap the outcome of `operation`
    pub fn from_result<E: ToolError>(operation: &str, outcome: Result<T, E>) -> Self {
        match outcome {
            Ok(result) => Self::success(result),
            Err(err) => Self::failure(ErrorBody::from_error(Some(operation), &err)),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorBody> {
        self.error.as_ref()
    }

    /// Convert back into a plain `Result`
    ///
    /// An envelope deserialized from elsewhere may claim `ok` without a
    /// result; that is reported as a `malformed_envelope` error body.
    pub fn into_result(self) -> Result<T, ErrorBody> {
        match (self.result, self.error) {
            (Some(result), None) if self.ok => Ok(result),
            (_, Some(error)) if !self.ok => Err(error),
            _ => Err(ErrorBody {
                kind: "malformed_envelope".to_string(),
                message: "envelope must carry exactly one of result or error".to_string(),
                operation: None,
            }),
        }
    }
}

impl<T: Serialize> Envelope<T> {
    /// Render as an MCP tool result
    ///
    /// Only a serialization failure escapes as a protocol error.
    pub fn into_call_result(self) -> McpResult<CallToolResult> {
        let json = serde_json::to_string_pretty(&self).map_err(|e| internal_error(e.to_string()))?;
        let content = vec![Content::text(json)];

        if self.ok {
            Ok(CallToolResult::success(content))
        } else {
            Ok(CallToolResult::error(content))
        }
    }
}
