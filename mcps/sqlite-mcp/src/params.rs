//! Parameter types for SQLite MCP tools
//!
//! Unknown keys are rejected so a misspelled argument (`id_colum`) fails
//! loudly instead of silently falling back to a default.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub(crate) fn default_id_column() -> String {
    "id".to_string()
}

pub(crate) fn default_name_column() -> String {
    "name".to_string()
}

/// Values for a statement's placeholders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SqlParams {
    /// Bound in order to `?` placeholders
    Positional(Vec<Value>),
    /// Bound by name to `:name`, `@name` or `$name` placeholders
    Named(Map<String, Value>),
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct QueryParams {
    #[schemars(description = "SQL statement to execute. Use placeholders for values, never inline them.")]
    pub sql: String,

    #[schemars(
        description = "Placeholder values: an array for ? placeholders or an object for :name placeholders"
    )]
    #[serde(default)]
    pub params: Option<SqlParams>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetItemByIdParams {
    #[schemars(description = "Table to read from")]
    pub table: String,

    #[schemars(description = "Value of the id column to match")]
    pub id_value: Value,

    #[schemars(description = "Column holding the id (default: id)")]
    #[serde(default = "default_id_column")]
    pub id_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetItemByNameParams {
    #[schemars(description = "Table to read from")]
    pub table: String,

    #[schemars(description = "Value of the name column to match")]
    pub name_value: Value,

    #[schemars(description = "Column holding the name (default: name)")]
    #[serde(default = "default_name_column")]
    pub name_column: String,
}

/// Lookup on any column, with every argument spelled out
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetItemParams {
    #[schemars(description = "Table to read from")]
    pub table: String,

    #[schemars(description = "Value to match")]
    pub value: Value,

    #[schemars(description = "Column to match the value against")]
    pub column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetAllItemsParams {
    #[schemars(description = "Table to read from")]
    pub table: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ListTablesParams {
    #[schemars(description = "Optional SQL LIKE pattern to filter table names (e.g. 'user%')")]
    #[serde(default)]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateItemParams {
    #[schemars(description = "Table to insert into")]
    pub table: String,

    #[schemars(description = "Column names mapped to the values of the new row")]
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateItemParams {
    #[schemars(description = "Table to update")]
    pub table: String,

    #[schemars(description = "Value of the id column identifying the row(s) to update")]
    pub id_value: Value,

    #[schemars(description = "Column names mapped to their new values")]
    pub data: Map<String, Value>,

    #[schemars(description = "Column holding the id (default: id)")]
    #[serde(default = "default_id_column")]
    pub id_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DeleteItemParams {
    #[schemars(description = "Table to delete from")]
    pub table: String,

    #[schemars(description = "Value of the id column identifying the row(s) to delete")]
    pub id_value: Value,

    #[schemars(description = "Column holding the id (default: id)")]
    #[serde(default = "default_id_column")]
    pub id_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DescribeTableParams {
    #[schemars(description = "Table to describe")]
    pub table: String,
}
