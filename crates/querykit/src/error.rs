//! Error types for querykit

use crate::driver::DriverError;
use thiserror::Error;

/// Result type alias for querykit operations
pub type DbResult<T> = Result<T, DbError>;

/// Error types for statement construction and execution
#[derive(Debug, Error)]
pub enum DbError {
    /// Query execution error.
    ///
    /// `sql` holds the statement with every placeholder replaced by its bound
    /// value, so the failing statement can be read (and replayed by hand).
    #[error("{source}\n Query: {sql}")]
    Query {
        sql: String,
        #[source]
        source: DriverError,
    },

    /// The builder was used in a way that can never produce a valid statement
    #[error("Invalid builder usage: {0}")]
    InvalidUsage(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl DbError {
    /// Wrap a driver failure together with the diagnostic SQL.
    pub fn query(sql: impl Into<String>, source: DriverError) -> Self {
        Self::Query {
            sql: sql.into(),
            source,
        }
    }

    /// Create an invalid usage error
    pub fn invalid_usage(message: impl Into<String>) -> Self {
        Self::InvalidUsage(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a query execution error
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query { .. })
    }

    /// Check if this is an invalid usage error
    pub fn is_invalid_usage(&self) -> bool {
        matches!(self, Self::InvalidUsage(_))
    }

    /// The interpolated SQL attached to a query execution error.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Query { sql, .. } => Some(sql),
            _ => None,
        }
    }

    /// The driver-level error code attached to a query execution error, if any.
    pub fn driver_code(&self) -> Option<&str> {
        match self {
            Self::Query { source, .. } => source.code(),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for DbError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
