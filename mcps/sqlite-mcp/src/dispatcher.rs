//! Operation dispatcher
//!
//! Routes an invocation to its handler and turns the result into exactly one
//! [`Envelope`]. Handlers never see raw JSON; by the time they run, names
//! are resolved and arguments are typed.

use std::future::Future;
use std::time::Instant;

use mcp_common::{Envelope, ToolError};
use serde_json::Value;

use crate::database::{Database, Outcome};
use crate::error::DbError;
use crate::handlers;
use crate::registry::{self, Invocation};

#[derive(Clone)]
pub struct Dispatcher {
    db: Database,
}

impl Dispatcher {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Resolve `name`, validate `args` and run the operation
    pub async fn dispatch(&self, name: &str, args: Value) -> Envelope<Outcome> {
        self.dispatch_until(name, args, std::future::pending()).await
    }

    /// Like [`dispatch`](Self::dispatch), giving up once `cancelled` resolves
    pub async fn dispatch_until<C>(&self, name: &str, args: Value, cancelled: C) -> Envelope<Outcome>
    where
        C: Future<Output = ()>,
    {
        match registry::lookup(name).and_then(|op| op.validate(args)) {
            Ok(invocation) => self.execute_until(invocation, cancelled).await,
            Err(e) => {
                tracing::warn!(operation = name, kind = e.kind(), "rejected: {}", e);
                Envelope::from_result(name, Err::<Outcome, _>(e))
            }
        }
    }

    pub async fn execute(&self, invocation: Invocation) -> Envelope<Outcome> {
        self.execute_until(invocation, std::future::pending()).await
    }

    /// Run a typed invocation unless `cancelled` resolves first
    ///
    /// A statement already handed to SQLite runs to completion in the
    /// background and releases the connection when done; the caller just
    /// stops waiting for it.
    pub async fn execute_until<C>(&self, invocation: Invocation, cancelled: C) -> Envelope<Outcome>
    where
        C: Future<Output = ()>,
    {
        let operation = invocation.operation();
        let started = Instant::now();
        tracing::info!(operation, "dispatching");

        let result = tokio::select! {
            biased;
            _ = cancelled => Err(DbError::Cancelled),
            result = self.run(invocation) => result,
        };

        match &result {
            Ok(_) => tracing::info!(
                operation,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "completed"
            ),
            Err(e) => tracing::warn!(
                operation,
                kind = e.kind(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "failed: {}",
                e
            ),
        }

        Envelope::from_result(operation, result)
    }

    async fn run(&self, invocation: Invocation) -> Result<Outcome, DbError> {
        let db = &self.db;
        match invocation {
            Invocation::SqliteQuery(params) => handlers::sqlite_query(db, params).await,
            Invocation::GetItemById(params) => handlers::get_item_by_id(db, params).await,
            Invocation::GetItemByName(params) => handlers::get_item_by_name(db, params).await,
            Invocation::GetItem(params) => handlers::get_item(db, params).await,
            Invocation::GetAllItems(params) => handlers::get_all_items(db, params).await,
            Invocation::ListAllTables(params) | Invocation::GetAllTables(params) => {
                handlers::list_all_tables(db, params).await
            }
            Invocation::CreateItem(params) => handlers::create_item(db, params).await,
            Invocation::UpdateItem(params) => handlers::update_item(db, params).await,
            Invocation::DeleteItem(params) => handlers::delete_item(db, params).await,
            Invocation::GetDbVersion => handlers::get_db_version(db).await,
            Invocation::DescribeTable(params) => handlers::describe_table(db, params).await,
        }
    }
}
