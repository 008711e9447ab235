//! Table operation handlers
//!
//! Each handler validates identifiers, builds its statement and hands it to
//! the [`Database`]. Values are always bound; identifiers reach SQL text
//! only as [`Identifier`]s, through the statement builders below.

use rusqlite::params;
use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Value};

use crate::database::{to_sql_value, Affected, Bindings, Database, Outcome};
use crate::error::DbError;
use crate::identifier::Identifier;
use crate::params::*;

// ============================================================================
// Statement Builders
// ============================================================================

fn select_all(table: &Identifier) -> String {
    format!("SELECT * FROM {}", table)
}

fn select_where(table: &Identifier, column: &Identifier) -> String {
    format!("SELECT * FROM {} WHERE {} = ?", table, column)
}

fn insert_into(table: &Identifier, columns: &[Identifier]) -> String {
    let names: Vec<String> = columns.iter().map(ToString::to_string).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        names.join(", "),
        placeholders
    )
}

fn update_where(table: &Identifier, columns: &[Identifier], key: &Identifier) -> String {
    let assignments: Vec<String> = columns.iter().map(|c| format!("{} = ?", c)).collect();
    format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table,
        assignments.join(", "),
        key
    )
}

fn delete_where(table: &Identifier, key: &Identifier) -> String {
    format!("DELETE FROM {} WHERE {} = ?", table, key)
}

const LIST_TABLES_SQL: &str = r"SELECT name FROM sqlite_master
    WHERE type = 'table'
      AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
      AND (?1 IS NULL OR name LIKE ?1)
    ORDER BY name";

const DESCRIBE_TABLE_SQL: &str =
    r#"SELECT cid, name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1)"#;

// ============================================================================
// Helper Functions
// ============================================================================

fn scalar(argument: &str, value: &Value) -> Result<SqlValue, DbError> {
    to_sql_value(value).ok_or_else(|| {
        DbError::invalid_arguments(format!(
            "{} must be a scalar (string, number, boolean or null)",
            argument
        ))
    })
}

/// Validate a `data` payload into column identifiers and bound values
fn split_payload(
    table: &str,
    data: &Map<String, Value>,
) -> Result<(Vec<Identifier>, Vec<SqlValue>), DbError> {
    if data.is_empty() {
        return Err(DbError::EmptyPayload {
            table: table.to_string(),
        });
    }

    let mut columns = Vec::with_capacity(data.len());
    let mut values = Vec::with_capacity(data.len() + 1);
    for (column, value) in data {
        columns.push(Identifier::parse(column)?);
        values.push(scalar(&format!("data.{}", column), value)?);
    }

    Ok((columns, values))
}

fn ensure_writable(db: &Database) -> Result<(), DbError> {
    if db.is_read_only() {
        Err(DbError::ReadOnly)
    } else {
        Ok(())
    }
}

fn no_match(table: &Identifier, column: &Identifier, value: &Value) -> DbError {
    DbError::NotFound {
        table: table.as_str().to_string(),
        detail: format!("no row where {} = {}", column.as_str(), value),
    }
}

/// Rows of `table` whose `column` equals `value`; `NotFound` when none
async fn find_rows(
    db: &Database,
    table: &str,
    column: &str,
    argument: &str,
    value: &Value,
) -> Result<Outcome, DbError> {
    let table = Identifier::parse(table)?;
    let column = Identifier::parse(column)?;
    let bound = scalar(argument, value)?;

    let outcome = db
        .execute(select_where(&table, &column), Bindings::Positional(vec![bound]))
        .await
        .map_err(|e| e.on_table(table.as_str()))?;

    match outcome {
        Outcome::Rows(rows) if rows.is_empty() => Err(no_match(&table, &column, value)),
        outcome => Ok(outcome),
    }
}

/// A write that changed nothing becomes `NotFound`
fn require_match(
    outcome: Outcome,
    table: &Identifier,
    key: &Identifier,
    value: &Value,
) -> Result<Outcome, DbError> {
    match outcome {
        Outcome::Affected(Affected { count: 0, .. }) => Err(no_match(table, key, value)),
        outcome => Ok(outcome),
    }
}

// ============================================================================
// Handler Functions
// ============================================================================

/// Raw SQL, the only operation that accepts statement text from the caller
pub async fn sqlite_query(db: &Database, params: QueryParams) -> Result<Outcome, DbError> {
    let bindings = match &params.params {
        None => Bindings::None,
        Some(SqlParams::Positional(values)) => Bindings::positional(values)?,
        Some(SqlParams::Named(values)) => Bindings::named(values)?,
    };

    db.execute(params.sql, bindings).await
}

pub async fn get_item_by_id(db: &Database, params: GetItemByIdParams) -> Result<Outcome, DbError> {
    find_rows(
        db,
        &params.table,
        &params.id_column,
        "id_value",
        &params.id_value,
    )
    .await
}

pub async fn get_item_by_name(
    db: &Database,
    params: GetItemByNameParams,
) -> Result<Outcome, DbError> {
    find_rows(
        db,
        &params.table,
        &params.name_column,
        "name_value",
        &params.name_value,
    )
    .await
}

/// `get_item`: match `value` against an explicitly named column
pub async fn get_item(db: &Database, params: GetItemParams) -> Result<Outcome, DbError> {
    find_rows(db, &params.table, &params.column, "value", &params.value).await
}

pub async fn get_all_items(db: &Database, params: GetAllItemsParams) -> Result<Outcome, DbError> {
    let table = Identifier::parse(&params.table)?;

    db.execute(select_all(&table), Bindings::None)
        .await
        .map_err(|e| e.on_table(table.as_str()))
}

pub async fn list_all_tables(db: &Database, params: ListTablesParams) -> Result<Outcome, DbError> {
    let pattern = params.pattern;

    db.with_connection(move |conn| {
        let mut stmt = conn.prepare(LIST_TABLES_SQL)?;
        let names = stmt
            .query_map(params![pattern], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Outcome::Tables(names))
    })
    .await
}

pub async fn create_item(db: &Database, params: CreateItemParams) -> Result<Outcome, DbError> {
    ensure_writable(db)?;
    let table = Identifier::parse(&params.table)?;
    let (columns, values) = split_payload(table.as_str(), &params.data)?;

    db.execute(insert_into(&table, &columns), Bindings::Positional(values))
        .await
        .map_err(|e| e.on_table(table.as_str()))
}

pub async fn update_item(db: &Database, params: UpdateItemParams) -> Result<Outcome, DbError> {
    ensure_writable(db)?;
    let table = Identifier::parse(&params.table)?;
    let key = Identifier::parse(&params.id_column)?;
    let (columns, mut values) = split_payload(table.as_str(), &params.data)?;
    values.push(scalar("id_value", &params.id_value)?);

    let outcome = db
        .execute(
            update_where(&table, &columns, &key),
            Bindings::Positional(values),
        )
        .await
        .map_err(|e| e.on_table(table.as_str()))?;

    require_match(outcome, &table, &key, &params.id_value)
}

pub async fn delete_item(db: &Database, params: DeleteItemParams) -> Result<Outcome, DbError> {
    ensure_writable(db)?;
    let table = Identifier::parse(&params.table)?;
    let key = Identifier::parse(&params.id_column)?;
    let id = scalar("id_value", &params.id_value)?;

    let outcome = db
        .execute(delete_where(&table, &key), Bindings::Positional(vec![id]))
        .await
        .map_err(|e| e.on_table(table.as_str()))?;

    require_match(outcome, &table, &key, &params.id_value)
}

pub async fn get_db_version(db: &Database) -> Result<Outcome, DbError> {
    db.with_connection(|conn| {
        let version: String = conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;
        Ok(Outcome::Version(version))
    })
    .await
}

/// Column metadata for a table, one row per column
pub async fn describe_table(db: &Database, params: DescribeTableParams) -> Result<Outcome, DbError> {
    let table = Identifier::parse(&params.table)?;
    let name = SqlValue::Text(table.as_str().to_string());

    match db
        .execute(DESCRIBE_TABLE_SQL.to_string(), Bindings::Positional(vec![name]))
        .await?
    {
        Outcome::Rows(rows) if rows.is_empty() => Err(DbError::NotFound {
            table: table.as_str().to_string(),
            detail: "table does not exist".to_string(),
        }),
        outcome => Ok(outcome),
    }
}
