//! Convenient imports for typical `querykit` usage.
//!
//! ```ignore
//! use querykit::prelude::*;
//! ```

pub use crate::{
    raw, Connection, ConnectionRegistry, Cursor, DatabaseConfig, DbError, DbResult, Direction,
    FromRow, FromValue, InsertPayload, QueryBuilder, Record, Row, UpsertOutcome, Value,
};
