//! Operation registry
//!
//! A static table of every operation: its name, its parameter schema and
//! how to bind validated arguments to a typed [`Invocation`]. The MCP tool
//! router exposes the same operations; a test keeps the two in step.

use serde_json::{Map, Value};

use crate::error::DbError;
use crate::params::*;

/// Argument type as seen on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    /// null, boolean, number or string
    Scalar,
    Object,
    /// array or object
    Placeholders,
}

impl ParamKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Scalar => !value.is_array() && !value.is_object(),
            ParamKind::Object => value.is_object(),
            ParamKind::Placeholders => value.is_array() || value.is_object() || value.is_null(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            ParamKind::String => "a string",
            ParamKind::Scalar => "a scalar",
            ParamKind::Object => "an object",
            ParamKind::Placeholders => "an array or object",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<&'static str>,
}

const fn required(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: true,
        default: None,
    }
}

const fn optional(name: &'static str, kind: ParamKind, default: Option<&'static str>) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: false,
        default,
    }
}

/// A validated call, ready to run
#[derive(Debug, Clone)]
pub enum Invocation {
    SqliteQuery(QueryParams),
    GetItemById(GetItemByIdParams),
    GetItemByName(GetItemByNameParams),
    GetItem(GetItemParams),
    GetAllItems(GetAllItemsParams),
    ListAllTables(ListTablesParams),
    GetAllTables(ListTablesParams),
    CreateItem(CreateItemParams),
    UpdateItem(UpdateItemParams),
    DeleteItem(DeleteItemParams),
    GetDbVersion,
    DescribeTable(DescribeTableParams),
}

impl Invocation {
    pub fn operation(&self) -> &'static str {
        match self {
            Invocation::SqliteQuery(_) => "sqlite_query",
            Invocation::GetItemById(_) => "get_item_by_id",
            Invocation::GetItemByName(_) => "get_item_by_name",
            Invocation::GetItem(_) => "get_item",
            Invocation::GetAllItems(_) => "get_all_items",
            Invocation::ListAllTables(_) => "list_all_tables",
            Invocation::GetAllTables(_) => "get_all_tables",
            Invocation::CreateItem(_) => "create_item",
            Invocation::UpdateItem(_) => "update_item",
            Invocation::DeleteItem(_) => "delete_item",
            Invocation::GetDbVersion => "get_db_version",
            Invocation::DescribeTable(_) => "describe_table",
        }
    }
}

type Binder = fn(Value) -> serde_json::Result<Invocation>;

/// Immutable description of one operation
#[derive(Debug)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub params: &'static [ParamSpec],
    bind: Binder,
}

const TABLE: ParamSpec = required("table", ParamKind::String);
const ID_VALUE: ParamSpec = required("id_value", ParamKind::Scalar);
const ID_COLUMN: ParamSpec = optional("id_column", ParamKind::String, Some("id"));
const DATA: ParamSpec = required("data", ParamKind::Object);
const PATTERN: ParamSpec = optional("pattern", ParamKind::String, None);

pub static OPERATIONS: &[OperationDescriptor] = &[
    OperationDescriptor {
        name: "sqlite_query",
        params: &[
            required("sql", ParamKind::String),
            optional("params", ParamKind::Placeholders, None),
        ],
        bind: |v| serde_json::from_value(v).map(Invocation::SqliteQuery),
    },
    OperationDescriptor {
        name: "get_item_by_id",
        params: &[TABLE, ID_VALUE, ID_COLUMN],
        bind: |v| serde_json::from_value(v).map(Invocation::GetItemById),
    },
    OperationDescriptor {
        name: "get_item_by_name",
        params: &[
            TABLE,
            required("name_value", ParamKind::Scalar),
            optional("name_column", ParamKind::String, Some("name")),
        ],
        bind: |v| serde_json::from_value(v).map(Invocation::GetItemByName),
    },
    OperationDescriptor {
        name: "get_item",
        params: &[
            TABLE,
            required("value", ParamKind::Scalar),
            required("column", ParamKind::String),
        ],
        bind: |v| serde_json::from_value(v).map(Invocation::GetItem),
    },
    OperationDescriptor {
        name: "get_all_items",
        params: &[TABLE],
        bind: |v| serde_json::from_value(v).map(Invocation::GetAllItems),
    },
    OperationDescriptor {
        name: "list_all_tables",
        params: &[PATTERN],
        bind: |v| serde_json::from_value(v).map(Invocation::ListAllTables),
    },
    OperationDescriptor {
        name: "get_all_tables",
        params: &[PATTERN],
        bind: |v| serde_json::from_value(v).map(Invocation::GetAllTables),
    },
    OperationDescriptor {
        name: "create_item",
        params: &[TABLE, DATA],
        bind: |v| serde_json::from_value(v).map(Invocation::CreateItem),
    },
    OperationDescriptor {
        name: "update_item",
        params: &[TABLE, ID_VALUE, DATA, ID_COLUMN],
        bind: |v| serde_json::from_value(v).map(Invocation::UpdateItem),
    },
    OperationDescriptor {
        name: "delete_item",
        params: &[TABLE, ID_VALUE, ID_COLUMN],
        bind: |v| serde_json::from_value(v).map(Invocation::DeleteItem),
    },
    OperationDescriptor {
        name: "get_db_version",
        params: &[],
        bind: |_| Ok(Invocation::GetDbVersion),
    },
    OperationDescriptor {
        name: "describe_table",
        params: &[TABLE],
        bind: |v| serde_json::from_value(v).map(Invocation::DescribeTable),
    },
];

/// Find an operation by name
pub fn lookup(name: &str) -> Result<&'static OperationDescriptor, DbError> {
    OPERATIONS
        .iter()
        .find(|op| op.name == name)
        .ok_or_else(|| DbError::UnknownOperation(name.to_string()))
}

impl OperationDescriptor {
    /// Check `args` against the schema and bind them
    ///
    /// `null` counts as an empty argument object. Every problem is reported
    /// at once: missing required keys, unknown keys, and keys of the wrong
    /// type.
    pub fn validate(&self, args: Value) -> Result<Invocation, DbError> {
        let args = match args {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(DbError::invalid_arguments(format!(
                    "{} expects an object of arguments, got {}",
                    self.name, other
                )))
            }
        };

        let mut problems = Vec::new();

        let missing: Vec<&str> = self
            .params
            .iter()
            .filter(|spec| spec.required && !args.contains_key(spec.name))
            .map(|spec| spec.name)
            .collect();
        if !missing.is_empty() {
            problems.push(format!("missing: {}", missing.join(", ")));
        }

        let unknown: Vec<&str> = args
            .keys()
            .filter(|key| !self.params.iter().any(|spec| spec.name == key.as_str()))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            problems.push(format!("unknown: {}", unknown.join(", ")));
        }

        for spec in self.params {
            if let Some(value) = args.get(spec.name) {
                let absent_optional = value.is_null() && !spec.required;
                if !absent_optional && !spec.kind.accepts(value) {
                    problems.push(format!("{} must be {}", spec.name, spec.kind.describe()));
                }
            }
        }

        if !problems.is_empty() {
            return Err(DbError::invalid_arguments(format!(
                "{}: {}",
                self.name,
                problems.join("; ")
            )));
        }

        // Optional keys sent as null fall back to their defaults
        let args: Map<String, Value> = args
            .into_iter()
            .filter(|(key, value)| !value.is_null() || self.is_required(key))
            .collect();

        (self.bind)(Value::Object(args))
            .map_err(|e| DbError::invalid_arguments(format!("{}: {}", self.name, e)))
    }

    fn is_required(&self, key: &str) -> bool {
        self.params
            .iter()
            .any(|spec| spec.name == key && spec.required)
    }
}
