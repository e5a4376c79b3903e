use crate::error::QueryError;
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, OpenFlags};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

/// Which statements the executor is willing to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExecutionPolicy {
    /// Database opened read-only; statements that would write are rejected.
    #[default]
    ReadOnly,
    /// Run whatever the model produced.
    AllowWrites,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
    pub execution_time_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnDef {
    pub name: String,
    /// Declared type of the source column; absent for expressions.
    pub data_type: Option<String>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    /// Exactly one row with one column.
    pub fn is_scalar(&self) -> bool {
        self.columns.len() == 1 && self.rows.len() == 1
    }

    pub fn scalar(&self) -> Option<&serde_json::Value> {
        if self.is_scalar() {
            self.rows[0].first()
        } else {
            None
        }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Result of [`run_query`]: on failure `result` is empty and `error` holds
/// the message shown to the user.
#[derive(Debug, Clone, Default)]
pub struct QueryOutcome {
    pub result: QueryResult,
    pub error: Option<String>,
}

impl QueryOutcome {
    pub fn failed(err: impl std::fmt::Display) -> Self {
        Self {
            result: QueryResult::default(),
            error: Some(format!("Error executing SQL: {}", err)),
        }
    }
}

/// Run `sql` exactly as given against the database file. The connection
/// lives only for this call.
///
/// Text holding nothing but whitespace or comments yields an empty result.
/// More than one statement is rejected before any of them runs.
pub fn execute_query(
    sql: &str,
    db_path: &Path,
    policy: ExecutionPolicy,
) -> Result<QueryResult, QueryError> {
    let start = Instant::now();
    let conn = open(db_path, policy)?;

    let mut batch = Batch::new(&conn, sql);
    let Some(mut stmt) = batch.next()? else {
        debug!("no statement to run");
        return Ok(QueryResult::default());
    };
    if batch.next()?.is_some() {
        return Err(QueryError::MultipleStatements);
    }
    if policy == ExecutionPolicy::ReadOnly && !stmt.readonly() {
        return Err(QueryError::NotReadOnly);
    }

    if stmt.column_count() == 0 {
        let changed = stmt.execute([])?;
        debug!(changed, "statement returned no columns");
        return Ok(QueryResult {
            execution_time_ms: start.elapsed().as_millis(),
            ..Default::default()
        });
    }

    let columns: Vec<ColumnDef> = stmt
        .columns()
        .iter()
        .map(|col| ColumnDef {
            name: col.name().to_string(),
            data_type: col.decl_type().map(str::to_string),
        })
        .collect();

    let mut result_rows = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            values.push(sqlite_value_to_json(row.get_ref(i)?));
        }
        result_rows.push(values);
    }

    let row_count = result_rows.len();
    Ok(QueryResult {
        columns,
        rows: result_rows,
        row_count,
        execution_time_ms: start.elapsed().as_millis(),
    })
}

/// Like [`execute_query`] but never fails: errors are logged and turned
/// into an empty result carrying the message.
pub fn run_query(sql: &str, db_path: &Path, policy: ExecutionPolicy) -> QueryOutcome {
    match execute_query(sql, db_path, policy) {
        Ok(result) => QueryOutcome {
            result,
            error: None,
        },
        Err(e) => {
            warn!(error = %e, sql, "query failed");
            QueryOutcome::failed(e)
        }
    }
}

fn open(db_path: &Path, policy: ExecutionPolicy) -> Result<Connection, QueryError> {
    let conn = match policy {
        ExecutionPolicy::ReadOnly => Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?,
        ExecutionPolicy::AllowWrites => {
            let conn = Connection::open(db_path)?;
            conn.pragma_update(None, "foreign_keys", true)?;
            conn
        }
    };
    Ok(conn)
}

fn sqlite_value_to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(v) => serde_json::Value::Number(v.into()),
        ValueRef::Real(v) => serde_json::Number::from_f64(v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
        ValueRef::Blob(bytes) => serde_json::Value::String(format!("<{} bytes>", bytes.len())),
    }
}
