//! Query execution against the process-wide SQLite connection
//!
//! All statements are serialized through one async mutex. The connection is
//! handed to the blocking thread pool together with its lock guard, so a
//! long statement never stalls the runtime and a caller that stops waiting
//! leaves the statement to finish on its own.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use indexmap::IndexMap;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Batch, Connection, OpenFlags, Statement};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::DatabaseConfig;
use crate::error::DbError;

/// One result row: column name to value, in result-set column order
pub type Row = IndexMap<String, Value>;

/// Normalized result of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A statement that produces a result set
    Rows(Vec<Row>),
    /// A statement that changes data
    Affected(Affected),
    /// Table names from the schema catalog
    Tables(Vec<String>),
    /// Engine version string
    Version(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affected {
    pub count: usize,
    pub last_insert_id: Option<i64>,
}

/// Values bound to a statement's placeholders
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Bindings {
    #[default]
    None,
    /// `?` / `?N` placeholders, in order
    Positional(Vec<SqlValue>),
    /// `:name`, `@name` or `$name` placeholders
    Named(Vec<(String, SqlValue)>),
}

impl Bindings {
    /// Build positional bindings from JSON scalars
    pub fn positional(values: &[Value]) -> Result<Self, DbError> {
        let values = values
            .iter()
            .enumerate()
            .map(|(i, v)| to_sql_value(v).ok_or_else(|| not_scalar(&format!("params[{}]", i))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Bindings::Positional(values))
    }

    /// Build named bindings from a JSON object of scalars
    pub fn named(values: &serde_json::Map<String, Value>) -> Result<Self, DbError> {
        let values = values
            .iter()
            .map(|(k, v)| {
                to_sql_value(v)
                    .map(|value| (k.clone(), value))
                    .ok_or_else(|| not_scalar(&format!("params.{}", k)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Bindings::Named(values))
    }

    fn bind(&self, stmt: &mut Statement<'_>) -> Result<(), DbError> {
        let expected = stmt.parameter_count();

        match self {
            Bindings::None => {
                if expected > 0 {
                    return Err(DbError::invalid_arguments(format!(
                        "statement has {} placeholder(s) but no params were given",
                        expected
                    )));
                }
            }
            Bindings::Positional(values) => {
                if values.len() != expected {
                    return Err(DbError::invalid_arguments(format!(
                        "statement has {} placeholder(s) but {} positional param(s) were given",
                        expected,
                        values.len()
                    )));
                }
                for (i, value) in values.iter().enumerate() {
                    stmt.raw_bind_parameter(i + 1, value)?;
                }
            }
            Bindings::Named(values) => {
                let mut bound = vec![false; expected];
                for (name, value) in values {
                    let index = placeholder_index(stmt, name)?.ok_or_else(|| {
                        DbError::invalid_arguments(format!(
                            "statement has no placeholder named '{}'",
                            name
                        ))
                    })?;
                    if std::mem::replace(&mut bound[index - 1], true) {
                        return Err(DbError::invalid_arguments(format!(
                            "more than one param binds placeholder '{}'",
                            stmt.parameter_name(index).unwrap_or(name.as_str())
                        )));
                    }
                    stmt.raw_bind_parameter(index, value)?;
                }

                let unbound: Vec<String> = bound
                    .iter()
                    .enumerate()
                    .filter(|(_, done)| !**done)
                    .map(|(i, _)| match stmt.parameter_name(i + 1) {
                        Some(name) => name.to_string(),
                        None => format!("?{}", i + 1),
                    })
                    .collect();
                if !unbound.is_empty() {
                    return Err(DbError::invalid_arguments(format!(
                        "no value given for placeholder(s): {}",
                        unbound.join(", ")
                    )));
                }
            }
        }

        Ok(())
    }
}

fn placeholder_index(stmt: &Statement<'_>, name: &str) -> Result<Option<usize>, DbError> {
    if name.starts_with([':', '@', '$']) {
        return Ok(stmt.parameter_index(name)?);
    }
    for prefix in [':', '@', '$'] {
        if let Some(index) = stmt.parameter_index(&format!("{}{}", prefix, name))? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

fn not_scalar(path: &str) -> DbError {
    DbError::invalid_arguments(format!(
        "{} must be a scalar (string, number, boolean or null)",
        path
    ))
}

/// Convert a JSON scalar to a SQLite value; `None` for arrays and objects
pub fn to_sql_value(value: &Value) -> Option<SqlValue> {
    match value {
        Value::Null => Some(SqlValue::Null),
        Value::Bool(b) => Some(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(SqlValue::Integer(i)),
            None => n.as_f64().map(SqlValue::Real),
        },
        Value::String(s) => Some(SqlValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => {
            Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
    }
}

/// Column names made unique within a row: repeats get `_2`, `_3`, ...
///
/// A suffix never takes a name some other column already has.
fn unique_columns(stmt: &Statement<'_>) -> Vec<String> {
    let names = stmt.column_names();
    let taken: HashSet<&str> = names.iter().copied().collect();
    let mut used: HashSet<String> = HashSet::with_capacity(names.len());

    names
        .iter()
        .map(|&name| {
            let mut candidate = name.to_string();
            let mut n = 1;
            while used.contains(&candidate) || (n > 1 && taken.contains(candidate.as_str())) {
                n += 1;
                candidate = format!("{}_{}", name, n);
            }
            used.insert(candidate.clone());
            candidate
        })
        .collect()
}

/// What a statement without result columns does, judged by its verb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteKind {
    Insert,
    Change,
    Other,
}

fn write_kind(sql: &str) -> WriteKind {
    let sql = skip_leading_trivia(sql);
    let mut verb = leading_word(sql);
    if verb == "with" {
        verb = verb_after_ctes(&sql[4..]);
    }

    match verb.as_str() {
        "insert" | "replace" => WriteKind::Insert,
        "update" | "delete" => WriteKind::Change,
        _ => WriteKind::Other,
    }
}

fn leading_word(sql: &str) -> String {
    sql.chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// First DML verb outside the parentheses of a `WITH` clause
fn verb_after_ctes(mut sql: &str) -> String {
    let mut depth = 0usize;
    loop {
        sql = skip_leading_trivia(sql);
        let Some(c) = sql.chars().next() else {
            return String::new();
        };
        match c {
            '(' => {
                depth += 1;
                sql = &sql[1..];
            }
            ')' => {
                depth = depth.saturating_sub(1);
                sql = &sql[1..];
            }
            '\'' | '"' | '`' | '[' => {
                let close = if c == '[' { ']' } else { c };
                let rest = &sql[1..];
                sql = rest.find(close).map_or("", |i| &rest[i + 1..]);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let word = leading_word(sql);
                let len = sql
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(sql.len());
                if depth == 0
                    && matches!(
                        word.as_str(),
                        "insert" | "replace" | "update" | "delete" | "select" | "values"
                    )
                {
                    return word;
                }
                sql = &sql[len..];
            }
            c => sql = &sql[c.len_utf8()..],
        }
    }
}

fn skip_leading_trivia(mut sql: &str) -> &str {
    loop {
        sql = sql.trim_start();
        if let Some(rest) = sql.strip_prefix("--") {
            sql = rest.find('\n').map_or("", |i| &rest[i + 1..]);
        } else if let Some(rest) = sql.strip_prefix("/*") {
            sql = rest.find("*/").map_or("", |i| &rest[i + 2..]);
        } else {
            return sql;
        }
    }
}

/// Run one statement on a connection the caller already holds
///
/// Rows are returned when the prepared statement has result columns,
/// whatever its verb (`PRAGMA`, `INSERT ... RETURNING`, ...).
pub fn run_statement(
    conn: &Connection,
    sql: &str,
    bindings: &Bindings,
    read_only: bool,
) -> Result<Outcome, DbError> {
    let mut batch = Batch::new(conn, sql);
    let mut stmt = batch
        .next()?
        .ok_or_else(|| DbError::invalid_arguments("sql contains no statement"))?;
    if !matches!(batch.next(), Ok(None)) {
        return Err(DbError::invalid_arguments(
            "sql must contain exactly one statement",
        ));
    }

    if read_only && !stmt.readonly() {
        return Err(DbError::ReadOnly);
    }

    bindings.bind(&mut stmt)?;

    if stmt.column_count() > 0 {
        let columns = unique_columns(&stmt);
        let mut rows = stmt.raw_query();
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::with_capacity(columns.len());
            for (i, name) in columns.iter().enumerate() {
                record.insert(name.clone(), to_json(row.get_ref(i)?));
            }
            out.push(record);
        }
        Ok(Outcome::Rows(out))
    } else {
        let changed = stmt.raw_execute()?;
        // sqlite3_changes() is only updated by DML, so DDL would report a stale count
        let (count, last_insert_id) = match write_kind(sql) {
            WriteKind::Insert => (changed, (changed > 0).then(|| conn.last_insert_rowid())),
            WriteKind::Change => (changed, None),
            WriteKind::Other => (0, None),
        };
        Ok(Outcome::Affected(Affected {
            count,
            last_insert_id,
        }))
    }
}

/// The process-wide database handle
///
/// Cloning shares the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    read_only: bool,
}

impl Database {
    /// Open the database described by `config`
    ///
    /// With `create_if_missing`, missing parent directories are created and
    /// a missing file becomes an empty database.
    pub fn open(config: &DatabaseConfig) -> Result<Self, DbError> {
        let path = config.path.as_path();

        if config.create_if_missing && !config.read_only {
            ensure_parent_dir(path)?;
        }

        let mut flags = OpenFlags::default();
        if config.read_only {
            flags.remove(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE);
            flags.insert(OpenFlags::SQLITE_OPEN_READ_ONLY);
        } else if !config.create_if_missing {
            flags.remove(OpenFlags::SQLITE_OPEN_CREATE);
        }

        let conn = Connection::open_with_flags(path, flags)?;
        conn.busy_timeout(Duration::from_secs(config.busy_timeout_secs))?;

        tracing::info!(
            "Opened database at {} ({})",
            path.display(),
            if config.read_only { "read-only" } else { "read-write" }
        );

        Ok(Self::from_connection(conn, config.read_only))
    }

    /// Private in-memory database, mainly for tests and embedding
    pub fn open_in_memory() -> Result<Self, DbError> {
        Ok(Self::from_connection(Connection::open_in_memory()?, false))
    }

    pub fn from_connection(conn: Connection, read_only: bool) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            read_only,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Execute one statement with bound values
    pub async fn execute(&self, sql: String, bindings: Bindings) -> Result<Outcome, DbError> {
        let read_only = self.read_only;
        self.with_connection(move |conn| {
            tracing::debug!(sql = %sql, "executing statement");
            run_statement(conn, &sql, &bindings, read_only)
        })
        .await
    }

    /// Run `f` with exclusive use of the connection on the blocking pool
    ///
    /// Everything inside `f` is atomic with respect to other callers, e.g.
    /// an insert and the `last_insert_rowid` read that follows it.
    pub async fn with_connection<T, F>(&self, f: F) -> Result<T, DbError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, DbError> + Send + 'static,
    {
        let guard = Arc::clone(&self.conn).lock_owned().await;

        tokio::task::spawn_blocking(move || f(&*guard))
            .await
            .map_err(|e| DbError::Execution {
                code: "Internal".to_string(),
                message: format!("statement task failed: {}", e),
                table: None,
            })?
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), DbError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }

    std::fs::create_dir_all(parent).map_err(|e| DbError::Execution {
        code: "CannotOpen".to_string(),
        message: format!("failed to create directory {}: {}", parent.display(), e),
        table: None,
    })?;
    tracing::info!("Created database directory {}", parent.display());
    Ok(())
}
