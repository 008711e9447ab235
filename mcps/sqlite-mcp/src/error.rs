//! Error taxonomy for SQLite MCP operations

use mcp_common::ToolError;
use thiserror::Error;

/// Every way an operation can fail
///
/// Validation variants (`InvalidIdentifier`, `InvalidArguments`,
/// `EmptyPayload`, `UnknownOperation`, `ReadOnly`) are raised before any
/// statement runs.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: &'static str },

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("data for table '{table}' must contain at least one column")]
    EmptyPayload { table: String },

    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("{detail} (table '{table}')")]
    NotFound { table: String, detail: String },

    #[error("{}", execution_message(.code, .message, .table.as_deref()))]
    Execution {
        code: String,
        message: String,
        table: Option<String>,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("write operations are disabled: the database is open read-only")]
    ReadOnly,
}

fn execution_message(code: &str, message: &str, table: Option<&str>) -> String {
    match table {
        Some(table) => format!("sqlite error ({}) on table '{}': {}", code, table, message),
        None => format!("sqlite error ({}): {}", code, message),
    }
}

impl DbError {
    pub fn invalid_arguments(detail: impl Into<String>) -> Self {
        DbError::InvalidArguments(detail.into())
    }

    /// Attach the table an execution error happened on
    pub fn on_table(self, name: &str) -> Self {
        match self {
            DbError::Execution {
                code,
                message,
                table: None,
            } => DbError::Execution {
                code,
                message,
                table: Some(name.to_string()),
            },
            other => other,
        }
    }
}

impl ToolError for DbError {
    fn kind(&self) -> &'static str {
        match self {
            DbError::InvalidIdentifier { .. } => "invalid_identifier",
            DbError::InvalidArguments(_) => "invalid_arguments",
            DbError::EmptyPayload { .. } => "empty_payload",
            DbError::UnknownOperation(_) => "unknown_operation",
            DbError::NotFound { .. } => "not_found",
            DbError::Execution { .. } => "execution_error",
            DbError::Cancelled => "cancelled",
            DbError::ReadOnly => "read_only",
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match (&err, err.sqlite_error_code()) {
            (_, Some(code)) => format!("{:?}", code),
            (rusqlite::Error::InvalidColumnType(..), None)
            | (rusqlite::Error::FromSqlConversionFailure(..), None)
            | (rusqlite::Error::ToSqlConversionFailure(_), None) => "TypeMismatch".to_string(),
            _ => "Other".to_string(),
        };
        let message = match &err {
            rusqlite::Error::SqliteFailure(_, Some(detail)) => detail.clone(),
            _ => err.to_string(),
        };

        DbError::Execution {
            code,
            message,
            table: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(DbError::Cancelled.kind(), "cancelled");
        assert_eq!(DbError::ReadOnly.kind(), "read_only");
        assert_eq!(
            DbError::UnknownOperation("drop_everything".into()).kind(),
            "unknown_operation"
        );
        assert_eq!(DbError::invalid_arguments("x").kind(), "invalid_arguments");
    }

    #[test]
    fn test_sqlite_failure_keeps_code_and_message() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err: DbError = conn.execute("SELEC nonsense", []).unwrap_err().into();
        match &err {
            DbError::Execution { code, message, .. } => {
                assert_eq!(code, "Unknown");
                assert!(message.contains("syntax error"), "message: {}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.kind(), "execution_error");
    }

    #[test]
    fn test_on_table_adds_context_once() {
        let err = DbError::Execution {
            code: "ConstraintViolation".into(),
            message: "UNIQUE constraint failed: users.email".into(),
            table: None,
        }
        .on_table("users")
        .on_table("ignored");

        let text = err.to_string();
        assert!(text.contains("on table 'users'"));
        assert!(text.contains("UNIQUE constraint failed"));
    }

    #[test]
    fn test_not_found_message() {
        let err = DbError::NotFound {
            table: "users".into(),
            detail: "no row where \"id\" = 999".into(),
        };
        assert_eq!(err.to_string(), "no row where \"id\" = 999 (table 'users')");
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_on_table_leaves_other_variants() {
        let err = DbError::Cancelled.on_table("users");
        assert!(matches!(err, DbError::Cancelled));
    }
}
