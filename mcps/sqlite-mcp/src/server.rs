//! SQLite MCP Server implementation
//!
//! Every tool passes its raw arguments to the [`Dispatcher`], which checks
//! them against the operation registry, and returns the resulting envelope
//! as JSON text. The parameter structs only describe the input schema.
//! Failures are tool errors (`is_error: true`), never protocol errors.

use anyhow::Context;
use mcp_common::{
    async_trait, CallToolResult, EmbeddableError, EmbeddableMcp, EmbeddableResult, McpError, Tool,
};
use rmcp::{
    handler::server::{common::schema_for_type, router::tool::ToolRouter},
    model::{JsonObject, ServerCapabilities, ServerInfo},
    service::RequestContext,
    tool, tool_handler, tool_router, RoleServer,
};
use serde_json::Value;

use crate::config::SqliteConfig;
use crate::database::Database;
use crate::dispatcher::Dispatcher;
use crate::params::*;
use crate::registry;

/// SQLite MCP Server
#[derive(Clone)]
pub struct SqliteMcpServer {
    dispatcher: Dispatcher,
    tool_router: ToolRouter<Self>,
}

impl SqliteMcpServer {
    /// Open the configured database and build the server
    pub fn new(config: &SqliteConfig) -> anyhow::Result<Self> {
        let db = Database::open(&config.database).with_context(|| {
            format!(
                "Failed to open database at {}",
                config.database.path.display()
            )
        })?;

        Ok(Self::with_database(db))
    }

    pub fn with_database(db: Database) -> Self {
        Self {
            dispatcher: Dispatcher::new(db),
            tool_router: Self::tool_router(),
        }
    }

    /// Server over a private in-memory database
    pub fn in_memory() -> anyhow::Result<Self> {
        Ok(Self::with_database(Database::open_in_memory()?))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    async fn run(
        &self,
        operation: &str,
        args: JsonObject,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatcher
            .dispatch_until(operation, Value::Object(args), context.ct.cancelled())
            .await
            .into_call_result()
    }
}

#[tool_router]
impl SqliteMcpServer {
    #[tool(
        description = "Execute a single SQL statement. Pass values through params (an array for ? placeholders, an object for :name placeholders), never inline. Returns {rows} for statements with a result set, otherwise {affected: {count, last_insert_id}}.",
        input_schema = schema_for_type::<QueryParams>()
    )]
    async fn sqlite_query(
        &self,
        args: JsonObject,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.run("sqlite_query", args, context).await
    }

    #[tool(
        description = "Fetch the rows of a table whose id column (default 'id') equals id_value. Fails with not_found when no row matches.",
        input_schema = schema_for_type::<GetItemByIdParams>()
    )]
    async fn get_item_by_id(
        &self,
        args: JsonObject,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.run("get_item_by_id", args, context).await
    }

    #[tool(
        description = "Fetch the rows of a table whose name column (default 'name') equals name_value. Fails with not_found when no row matches.",
        input_schema = schema_for_type::<GetItemByNameParams>()
    )]
    async fn get_item_by_name(
        &self,
        args: JsonObject,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.run("get_item_by_name", args, context).await
    }

    #[tool(
        description = "Fetch the rows of a table whose given column equals value. Fails with not_found when no row matches.",
        input_schema = schema_for_type::<GetItemParams>()
    )]
    async fn get_item(
        &self,
        args: JsonObject,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.run("get_item", args, context).await
    }

    #[tool(
        description = "Fetch every row of a table, in storage order. An empty table returns no rows.",
        input_schema = schema_for_type::<GetAllItemsParams>()
    )]
    async fn get_all_items(
        &self,
        args: JsonObject,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.run("get_all_items", args, context).await
    }

    #[tool(
        description = "List user tables in the database, sorted by name. Optionally filter with a SQL LIKE pattern (e.g. 'user%').",
        input_schema = schema_for_type::<ListTablesParams>()
    )]
    async fn list_all_tables(
        &self,
        args: JsonObject,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.run("list_all_tables", args, context).await
    }

    /// Older name of `list_all_tables`
    #[tool(
        description = "Alias of list_all_tables.",
        input_schema = schema_for_type::<ListTablesParams>()
    )]
    async fn get_all_tables(
        &self,
        args: JsonObject,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.run("get_all_tables", args, context).await
    }

    #[tool(
        description = "Insert one row. data maps column names to values. Returns the affected count and the new row's id.",
        input_schema = schema_for_type::<CreateItemParams>()
    )]
    async fn create_item(
        &self,
        args: JsonObject,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.run("create_item", args, context).await
    }

    #[tool(
        description = "Set the columns in data on the rows whose id column (default 'id') equals id_value. Fails with not_found when no row matches.",
        input_schema = schema_for_type::<UpdateItemParams>()
    )]
    async fn update_item(
        &self,
        args: JsonObject,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.run("update_item", args, context).await
    }

    #[tool(
        description = "Delete the rows whose id column (default 'id') equals id_value. Fails with not_found when no row matches.",
        input_schema = schema_for_type::<DeleteItemParams>()
    )]
    async fn delete_item(
        &self,
        args: JsonObject,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.run("delete_item", args, context).await
    }

    #[tool(description = "Report the version of the SQLite engine serving this database.")]
    async fn get_db_version(
        &self,
        args: JsonObject,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.run("get_db_version", args, context).await
    }

    #[tool(
        description = "Describe a table's columns: cid, name, type, notnull, dflt_value and pk, one row per column.",
        input_schema = schema_for_type::<DescribeTableParams>()
    )]
    async fn describe_table(
        &self,
        args: JsonObject,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.run("describe_table", args, context).await
    }
}

#[tool_handler]
impl rmcp::ServerHandler for SqliteMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mode = if self.dispatcher.database().is_read_only() {
            "read-only"
        } else {
            "read-write"
        };
        ServerInfo {
            instructions: Some(format!(
                "SQLite database MCP server ({} mode). \
                Use list_all_tables and describe_table to explore the schema, \
                get_all_items / get_item_by_id / get_item_by_name / get_item to read rows, \
                create_item / update_item / delete_item to change them, \
                and sqlite_query for anything else. \
                Every result is JSON of the form {{\"ok\": true, \"result\": ...}} \
                or {{\"ok\": false, \"error\": {{\"kind\", \"message\", \"operation\"}}}}.",
                mode
            )),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ============================================================================
// EmbeddableMcp Implementation
// ============================================================================

#[async_trait]
impl EmbeddableMcp for SqliteMcpServer {
    fn server_name(&self) -> &str {
        "sqlite"
    }

    fn server_description(&self) -> Option<&str> {
        Some(
            "SQLite MCP Server - generic table operations (read, create, update, delete) \
             and raw SQL over a single SQLite database.",
        )
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
        if registry::lookup(name).is_err() {
            return Err(EmbeddableError::ToolNotFound(name.to_string()));
        }

        self.dispatcher
            .dispatch(name, params)
            .await
            .into_call_result()
            .map_err(Into::into)
    }
}
