//! SQLite MCP Library
//!
//! Generic table operations over a single SQLite database: read rows by id,
//! by name or all at once, create, update and delete rows, list and describe
//! tables, and run raw SQL with bound parameters.
//!
//! Table and column names are validated as plain identifiers before they
//! reach SQL text; values are always bound. Every call yields exactly one
//! `{ok, result | error}` envelope.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use sqlite_mcp::{Database, Dispatcher};
//! use serde_json::json;
//!
//! let dispatcher = Dispatcher::new(Database::open_in_memory()?);
//! let envelope = dispatcher
//!     .dispatch("sqlite_query", json!({"sql": "SELECT sqlite_version() AS v"}))
//!     .await;
//! ```

pub mod config;
pub mod database;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod identifier;
pub mod params;
pub mod registry;
pub mod server;

#[cfg(test)]
mod tests;

pub use config::SqliteConfig;
pub use database::{Affected, Database, Outcome, Row};
pub use dispatcher::Dispatcher;
pub use error::DbError;
pub use identifier::Identifier;
pub use registry::{Invocation, OPERATIONS};
pub use server::SqliteMcpServer;
