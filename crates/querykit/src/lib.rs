//! # querykit
//!
//! A small synchronous SQL query builder, renderer and executor.
//!
//! ## Features
//!
//! - **Fluent builder**: one [`QueryBuilder`] per statement (SELECT, INSERT, UPDATE or DELETE)
//! - **Deterministic rendering**: `?` placeholders, unquoted identifiers, parameters in placeholder order
//! - **Literal expressions**: [`raw`] values render verbatim and never consume a placeholder
//! - **Pluggable drivers**: anything implementing [`Driver`]; SQLite (via `rusqlite`) is built in
//! - **Table locks and transactions**: `begin_transaction(&["orders"])` locks first, `commit` always unlocks
//! - **Diagnosable failures**: execution errors carry the SQL with parameters interpolated
//!
//! ## Quick start
//!
//! ```ignore
//! use querykit::prelude::*;
//!
//! let conn = Connection::open_in_memory("main")?;
//! conn.exec_raw("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)")?;
//!
//! let id = conn.table("users").insert(Record::new().set("name", "Ana").set("age", 31))?;
//!
//! let adults = conn
//!     .table("users")
//!     .where_op("age", ">=", 18)
//!     .order_by_asc("name")
//!     .get()?;
//!
//! let n = conn.table("users").count("*")?;
//! ```
//!
//! Logging goes through `tracing` under the `querykit.sql` target.

pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod expr;
pub mod prelude;
pub mod qb;
pub mod registry;
pub mod row;
pub mod value;

pub use config::{ConnectionConfig, DatabaseConfig};
pub use connection::Connection;
pub use driver::{Cursor, Driver, DriverError, DriverResult, DriverStatement};
pub use error::{DbError, DbResult};
pub use expr::{raw, Expression};
pub use qb::{
    AggregateFn, BuiltQuery, Command, Direction, InsertPayload, Op, QueryBuilder, QueryState,
    Record, UpsertOutcome,
};
pub use registry::{ConnectionRegistry, DriverFactory};
pub use row::{FromRow, Row};
pub use value::{FromValue, ParamType, Value};

#[cfg(feature = "sqlite")]
pub use driver::SqliteDriver;
