//! Driver seam between the statement executor and a concrete database client.
//!
//! [`Database`](super::Database) only talks to these traits, so tests can
//! substitute a scripted driver and production code uses
//! [`SqlxDriver`](super::SqlxDriver).

use thiserror::Error;

use crate::engine::Row;
use crate::error::{KiwiError, KiwiResult};
use crate::transpiler::Statement;
use crate::validator::is_identifier_safe;

/// Where to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOptions {
    /// MySQL server addressed by parts. `host` may carry a `:port` suffix.
    MySql {
        host: String,
        user: String,
        password: String,
        database: String,
    },
    /// Any URL the driver understands (`mysql://…`, `sqlite::memory:`).
    Url(String),
}

impl ConnectOptions {
    pub fn mysql(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        ConnectOptions::MySql {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        ConnectOptions::Url(url.into())
    }

    /// Reject options that cannot possibly connect.
    pub fn validate(&self) -> KiwiResult<()> {
        match self {
            ConnectOptions::MySql {
                host,
                user,
                database,
                ..
            } => {
                if host.is_empty() {
                    return Err(KiwiError::invalid("database host is empty"));
                }
                if user.is_empty() {
                    return Err(KiwiError::invalid("database user is empty"));
                }
                if !is_identifier_safe(database) {
                    return Err(KiwiError::invalid(format!(
                        "unsafe database name '{}'",
                        database
                    )));
                }
                Ok(())
            }
            ConnectOptions::Url(url) => {
                if url.trim().is_empty() {
                    Err(KiwiError::invalid("database URL is empty"))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Connection URL for URL-based clients. Credentials are percent-encoded.
    pub fn to_url(&self) -> KiwiResult<String> {
        match self {
            ConnectOptions::Url(url) => Ok(url.clone()),
            ConnectOptions::MySql {
                host,
                user,
                password,
                database,
            } => {
                let mut url = url::Url::parse("mysql://localhost")
                    .map_err(|e| KiwiError::invalid(e.to_string()))?;

                let (name, port) = split_port(host)?;
                url.set_host(Some(&name))
                    .map_err(|e| KiwiError::invalid(format!("invalid host '{}': {}", host, e)))?;
                url.set_port(port)
                    .map_err(|_| KiwiError::invalid(format!("invalid port in '{}'", host)))?;
                url.set_username(user)
                    .map_err(|_| KiwiError::invalid(format!("invalid user '{}'", user)))?;
                if !password.is_empty() {
                    url.set_password(Some(password))
                        .map_err(|_| KiwiError::invalid("invalid password"))?;
                }
                url.set_path(database);
                Ok(url.to_string())
            }
        }
    }
}

impl std::fmt::Display for ConnectOptions {
    /// Printable target without the password.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectOptions::MySql {
                host,
                user,
                database,
                ..
            } => write!(f, "mysql://{}@{}/{}", user, host, database),
            ConnectOptions::Url(raw) => match url::Url::parse(raw) {
                Ok(mut parsed) if parsed.password().is_some() => {
                    let _ = parsed.set_password(None);
                    write!(f, "{}", parsed)
                }
                _ => write!(f, "{}", raw),
            },
        }
    }
}

/// Split `host[:port]`. IPv6 literals come back bracketed for the URL;
/// a port after one needs the `[addr]:port` form.
fn split_port(host: &str) -> KiwiResult<(String, Option<u16>)> {
    let parse_port = |port: &str| {
        port.parse::<u16>()
            .map_err(|_| KiwiError::invalid(format!("invalid port in '{}'", host)))
    };

    if let Some(rest) = host.strip_prefix('[') {
        let (addr, tail) = rest
            .split_once(']')
            .ok_or_else(|| KiwiError::invalid(format!("unclosed '[' in host '{}'", host)))?;
        let port = match tail {
            "" => None,
            _ => match tail.strip_prefix(':') {
                Some(port) => Some(parse_port(port)?),
                None => {
                    return Err(KiwiError::invalid(format!("invalid host '{}'", host)));
                }
            },
        };
        return Ok((format!("[{}]", addr), port));
    }

    // bare IPv6 literal, no port
    if host.matches(':').count() > 1 {
        return Ok((format!("[{}]", host), None));
    }
    match host.split_once(':') {
        Some((name, port)) => Ok((name.to_string(), Some(parse_port(port)?))),
        None => Ok((host.to_string(), None)),
    }
}

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Execution {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

/// Eagerly materialized rows of a SELECT.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Column names as reported by the server, empty when no row came back.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Failures reported by a driver, classified for the executor.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Unique or primary key constraint violated.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// The server could not prepare the statement.
    #[error("prepare failed: {0}")]
    Prepare(String),

    /// A parameter could not be bound.
    #[error("bind failed: {0}")]
    Bind(String),

    #[error("execution failed: {0}")]
    Execute(String),

    /// A returned value could not be decoded.
    #[error("decode failed: {0}")]
    Decode(String),

    #[error("connection error: {0}")]
    Connection(String),
}

impl From<DriverError> for KiwiError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Prepare(_) | DriverError::Bind(_) => {
                KiwiError::QueryBuildFailed(err.to_string())
            }
            DriverError::Decode(_) => KiwiError::QueryResultInvalid(err.to_string()),
            DriverError::DuplicateKey(_) | DriverError::Execute(_) | DriverError::Connection(_) => {
                KiwiError::QueryExecutionFailed(err.to_string())
            }
        }
    }
}

/// Opens connections.
pub trait Driver {
    type Connection: Connection;

    fn open(&self, options: &ConnectOptions) -> Result<Self::Connection, DriverError>;
}

/// One live, blocking database connection.
pub trait Connection {
    /// Liveness probe.
    fn ping(&mut self) -> bool;

    fn close(self) -> Result<(), DriverError>;

    /// Prepare, bind and run a write statement.
    fn execute(&mut self, statement: &Statement) -> Result<Execution, DriverError>;

    /// Prepare, bind and run a SELECT, buffering every row.
    fn fetch_all(&mut self, statement: &Statement) -> Result<ResultSet, DriverError>;

    /// Run trusted SQL text without parameters.
    fn execute_raw(&mut self, sql: &str) -> Result<Execution, DriverError>;
}
