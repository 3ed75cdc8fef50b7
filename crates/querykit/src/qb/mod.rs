//! Query builder (QB) and renderer.
//!
//! A [`QueryBuilder`] accumulates exactly one statement (SELECT, INSERT,
//! UPDATE or DELETE) and its clauses. The renderer turns the accumulated
//! [`QueryState`] into SQL text with `?` placeholders, and the [`Binder`]
//! supplies the values for those placeholders in order.
//!
//! # Usage
//!
//! ```ignore
//! use querykit::{raw, Direction, InsertPayload, Record};
//!
//! // SELECT
//! let active = conn
//!     .table("users")
//!     .where_eq("status", "active")
//!     .where_in("role", ["admin", "staff"])
//!     .order_by("name", Direction::Asc)
//!     .get()?;
//!
//! // INSERT, multi-row
//! conn.table("tags").insert(vec![
//!     Record::from([("name", "rust")]),
//!     Record::from([("name", "sql")]),
//! ])?;
//!
//! // INSERT ... SELECT
//! conn.table("archive").insert(InsertPayload::select(["id", "title"], |q| {
//!     q.table("posts").select(["id", "title"]).where_op("created_at", "<", "2020-01-01")
//! }))?;
//!
//! // UPDATE with a literal expression
//! conn.table("posts")
//!     .where_eq("id", 7)
//!     .update(Record::new().set("views", raw("views + 1")))?;
//!
//! // Aggregate
//! let total = conn.table("orders").where_eq("paid", true).sum("amount")?;
//! ```

mod builder;
mod clause;
mod param;
mod render;
mod state;

pub use builder::{InsertPayload, QueryBuilder, UpsertOutcome};
pub use clause::{
    Aggregate, AggregateFn, Command, Direction, InsertSource, Join, JoinKind, Logic, Op, OrderBy,
    Predicate, Record, WhereEntry,
};
pub use param::{Binder, Phase};
pub use render::{interpolate, lock_tables_sql, render, unlock_tables_sql, AGGREGATE_ALIAS};
pub use state::QueryState;

use crate::value::Value;

/// Rendered SQL plus its parameters in placeholder order.
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl BuiltQuery {
    /// The SQL with every placeholder replaced by its value. Diagnostic only.
    pub fn interpolated(&self) -> String {
        interpolate(&self.sql, &self.params)
    }
}

/// Start a detached SELECT on `table` (render only).
pub fn table(table: &str) -> QueryBuilder<'static> {
    QueryBuilder::new().table(table)
}
