//! Database driver capability set.
//!
//! The executor never talks to a database library directly. Everything it
//! needs (statement preparation, positional binding, execution, fetching,
//! raw execution, identifiers and transaction control) goes through the
//! [`Driver`] and [`DriverStatement`] traits, so any backend that can offer
//! `?` placeholders can sit underneath a [`Connection`](crate::Connection).

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDriver;

use crate::row::Row;
use crate::value::{ParamType, Value};
use std::error::Error as StdError;
use thiserror::Error;

/// Result type alias for driver calls
pub type DriverResult<T> = Result<T, DriverError>;

/// A failure reported by the underlying database library.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DriverError {
    message: String,
    code: Option<String>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            source: None,
        }
    }

    /// Attach a backend-specific error code (SQLSTATE, extended result code, ...).
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

/// Where a single-row fetch positions the cursor before reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cursor {
    /// The row after the current one.
    #[default]
    Next,
    /// The row before the current one.
    Prior,
    First,
    Last,
    /// Zero-based row index.
    Absolute(usize),
    /// Offset from the current row; `Relative(1)` is the same as `Next`.
    Relative(isize),
}

/// A prepared statement.
pub trait DriverStatement {
    /// Bind `value` at the 1-indexed `position`.
    fn bind(&mut self, position: usize, value: &Value, hint: ParamType) -> DriverResult<()>;

    fn execute(&mut self) -> DriverResult<()>;

    /// Read one row of the executed statement at `cursor`, or `None` past the result set.
    fn fetch_one(&mut self, cursor: Cursor) -> DriverResult<Option<Row>>;

    /// Read every remaining row of the executed statement.
    fn fetch_all(&mut self) -> DriverResult<Vec<Row>>;

    /// Rows affected by the last execution.
    fn row_count(&self) -> u64;
}

/// An open database handle.
pub trait Driver {
    fn prepare(&mut self, sql: &str) -> DriverResult<Box<dyn DriverStatement + '_>>;

    /// Execute unprepared SQL and return the affected-row count.
    fn exec_raw(&mut self, sql: &str) -> DriverResult<u64>;

    fn last_insert_id(&self) -> DriverResult<i64>;

    fn begin(&mut self) -> DriverResult<()>;

    fn commit(&mut self) -> DriverResult<()>;

    fn rollback(&mut self) -> DriverResult<()>;

    fn in_transaction(&self) -> bool;

    /// Whether the backend understands `LOCK TABLES` / `UNLOCK TABLES`.
    fn supports_table_locks(&self) -> bool {
        true
    }
}
