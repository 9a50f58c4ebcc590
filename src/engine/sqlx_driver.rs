//! Blocking driver on top of sqlx's `Any` connection.
//!
//! sqlx is async; each connection drives it through a current-thread tokio
//! runtime with `block_on`, so every call returns only after the database
//! round-trip completes. Do not call into it from inside another runtime.

use std::sync::Arc;

use sqlx::any::{Any, AnyRow};
use sqlx::{AnyConnection, Column, Connection as _, Row as _, TypeInfo, ValueRef};
use tokio::runtime::{Builder, Runtime};

use crate::ast::Param;
use crate::engine::Row;
use crate::engine::driver::{ConnectOptions, Connection, Driver, DriverError, Execution, ResultSet};
use crate::error::KiwiResult;
use crate::transpiler::{Statement, StatementKind};

/// Opens MySQL or SQLite connections through sqlx.
#[derive(Clone)]
pub struct SqlxDriver {
    runtime: Arc<Runtime>,
}

impl SqlxDriver {
    pub fn new() -> KiwiResult<Self> {
        sqlx::any::install_default_drivers();
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }
}

impl Driver for SqlxDriver {
    type Connection = SqlxConnection;

    fn open(&self, options: &ConnectOptions) -> Result<SqlxConnection, DriverError> {
        let url = options
            .to_url()
            .map_err(|e| DriverError::Connection(e.to_string()))?;
        let conn = self
            .runtime
            .block_on(AnyConnection::connect(&url))
            .map_err(|e| DriverError::Connection(e.to_string()))?;

        Ok(SqlxConnection {
            conn,
            runtime: Arc::clone(&self.runtime),
        })
    }
}

/// A live sqlx connection plus the runtime that drives it.
pub struct SqlxConnection {
    conn: AnyConnection,
    runtime: Arc<Runtime>,
}

type AnyQuery<'q> = sqlx::query::Query<'q, Any, sqlx::any::AnyArguments<'q>>;

impl SqlxConnection {
    fn bind<'q>(sql: &'q str, params: &[Param]) -> AnyQuery<'q> {
        let mut query = sqlx::query::<Any>(sql);
        for param in params {
            query = match param {
                Param::Int(v) => query.bind(*v),
                Param::Float(v) => query.bind(*v),
                Param::Text(v) => query.bind(v.clone()),
            };
        }
        query
    }

    /// Ask the backend for the id of the row this connection inserted last.
    ///
    /// `Any` only carries the id through for MySQL; SQLite has to be asked.
    fn read_last_insert_id(&mut self) -> Result<Option<i64>, DriverError> {
        let Some(sql) = last_insert_id_sql(self.conn.backend_name()) else {
            return Ok(None);
        };
        let id = self
            .runtime
            .block_on(sqlx::query_scalar::<Any, i64>(sql).fetch_one(&mut self.conn))
            .map_err(classify)?;
        Ok(Some(id))
    }
}

fn last_insert_id_sql(backend: &str) -> Option<&'static str> {
    match backend.to_ascii_lowercase().as_str() {
        "sqlite" => Some("SELECT last_insert_rowid()"),
        "mysql" => Some("SELECT LAST_INSERT_ID()"),
        _ => None,
    }
}

impl Connection for SqlxConnection {
    fn ping(&mut self) -> bool {
        self.runtime.block_on(self.conn.ping()).is_ok()
    }

    fn close(self) -> Result<(), DriverError> {
        let SqlxConnection { conn, runtime } = self;
        runtime
            .block_on(conn.close())
            .map_err(|e| DriverError::Connection(e.to_string()))
    }

    fn execute(&mut self, statement: &Statement) -> Result<Execution, DriverError> {
        let query = Self::bind(&statement.sql, &statement.params);
        let done = self
            .runtime
            .block_on(query.execute(&mut self.conn))
            .map_err(classify)?;

        let mut last_insert_id = done.last_insert_id();
        if last_insert_id.is_none()
            && statement.kind == StatementKind::Insert
            && done.rows_affected() > 0
        {
            last_insert_id = self.read_last_insert_id()?;
        }

        Ok(Execution {
            rows_affected: done.rows_affected(),
            last_insert_id,
        })
    }

    fn fetch_all(&mut self, statement: &Statement) -> Result<ResultSet, DriverError> {
        let query = Self::bind(&statement.sql, &statement.params);
        let rows: Vec<AnyRow> = self
            .runtime
            .block_on(query.fetch_all(&mut self.conn))
            .map_err(classify)?;

        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let rows = rows.iter().map(row_to_map).collect::<Result<Vec<_>, _>>()?;

        Ok(ResultSet { columns, rows })
    }

    fn execute_raw(&mut self, sql: &str) -> Result<Execution, DriverError> {
        let done = self
            .runtime
            .block_on(sqlx::query::<Any>(sql).execute(&mut self.conn))
            .map_err(classify)?;

        Ok(Execution {
            rows_affected: done.rows_affected(),
            last_insert_id: done.last_insert_id(),
        })
    }
}

/// Sort a sqlx failure into the categories the executor cares about.
fn classify(err: sqlx::Error) -> DriverError {
    match &err {
        sqlx::Error::Database(db) => {
            if db.is_unique_violation() || is_mysql_duplicate(db.code().as_deref(), db.message()) {
                DriverError::DuplicateKey(db.message().to_string())
            } else if is_syntax_error(db.code().as_deref(), db.message()) {
                DriverError::Prepare(db.message().to_string())
            } else {
                DriverError::Execute(db.message().to_string())
            }
        }
        sqlx::Error::TypeNotFound { .. } => DriverError::Bind(err.to_string()),
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. } => DriverError::Decode(err.to_string()),
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::WorkerCrashed => DriverError::Connection(err.to_string()),
        _ => DriverError::Execute(err.to_string()),
    }
}

// ER_DUP_ENTRY reports SQLSTATE 23000 with a "Duplicate entry" message.
fn is_mysql_duplicate(code: Option<&str>, message: &str) -> bool {
    code == Some("23000") && message.starts_with("Duplicate entry")
}

fn is_syntax_error(code: Option<&str>, message: &str) -> bool {
    code == Some("42000") || message.contains("syntax error")
}

/// Convert an AnyRow to a Row.
fn row_to_map(row: &AnyRow) -> Result<Row, DriverError> {
    let mut map = Row::with_capacity(row.columns().len());
    for (i, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), decode_column(row, i)?);
    }
    Ok(map)
}

fn decode_column(row: &AnyRow, index: usize) -> Result<serde_json::Value, DriverError> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| DriverError::Decode(e.to_string()))?;
    if raw.is_null() {
        return Ok(serde_json::Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOLEAN" => row.try_get::<bool, _>(index).map(serde_json::Value::Bool),
        "SMALLINT" => row.try_get::<i16, _>(index).map(|v| v.into()),
        "INTEGER" => row.try_get::<i32, _>(index).map(|v| v.into()),
        "BIGINT" => row.try_get::<i64, _>(index).map(|v| v.into()),
        "REAL" => row
            .try_get::<f32, _>(index)
            .map(|v| float_to_json(v as f64)),
        "DOUBLE" => row.try_get::<f64, _>(index).map(float_to_json),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(|v| serde_json::Value::String(String::from_utf8_lossy(&v).into_owned())),
        _ => row.try_get::<String, _>(index).map(serde_json::Value::String),
    };

    value.map_err(|e| DriverError::Decode(e.to_string()))
}

fn float_to_json(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}
