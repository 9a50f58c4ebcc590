//! Error types for Kiwi.

use thiserror::Error;

/// The main error type for Kiwi operations.
#[derive(Debug, Error)]
pub enum KiwiError {
    /// Malformed caller arguments: unsafe identifier, disallowed operator,
    /// unsupported value type, empty field map and so on.
    /// Always raised before any SQL reaches the database.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation attempted without a live connection.
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// Opening or closing the connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Statement preparation or parameter binding failed.
    #[error("Query build failed: {0}")]
    QueryBuildFailed(String),

    /// The database rejected the statement.
    #[error("Query execution failed: {0}")]
    QueryExecutionFailed(String),

    /// The result set did not have the requested shape.
    #[error("Invalid query result: {0}")]
    QueryResultInvalid(String),

    /// Failed to parse a textual condition or field expression.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KiwiError {
    /// Create an invalid input error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Whether this error was caused by the caller's arguments.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::Parse { .. })
    }
}

/// Result type alias for Kiwi operations.
pub type KiwiResult<T> = Result<T, KiwiError>;
