//! Accumulated builder state, as seen by the renderer.

use super::clause::{Aggregate, Command, InsertSource, Join, OrderBy, Record, WhereEntry};
use super::param::{Binder, Phase};
use crate::value::Value;

/// Everything one builder has accumulated for its statement.
///
/// Exposed read-only through typed getters; only the builder mutates it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryState {
    pub(crate) command: Command,
    pub(crate) columns: Vec<String>,
    pub(crate) distinct: bool,
    pub(crate) table: Option<String>,
    pub(crate) from: Option<String>,
    pub(crate) joins: Vec<Join>,
    pub(crate) wheres: Vec<WhereEntry>,
    pub(crate) group_by: Vec<String>,
    pub(crate) order_by: Vec<OrderBy>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) aggregate: Option<Aggregate>,
    pub(crate) insert: Option<InsertSource>,
    pub(crate) update: Option<Record>,
    pub(crate) binder: Binder,
    pub(crate) build_error: Option<String>,
}

impl QueryState {
    pub fn command(&self) -> Command {
        self.command
    }

    /// Projection list; empty means `*`.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Target table of INSERT/UPDATE/DELETE.
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// FROM target of SELECT.
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn wheres(&self) -> &[WhereEntry] {
        &self.wheres
    }

    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }

    pub fn order_by(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn aggregate(&self) -> Option<&Aggregate> {
        self.aggregate.as_ref()
    }

    pub fn insert_source(&self) -> Option<&InsertSource> {
        self.insert.as_ref()
    }

    pub fn update_payload(&self) -> Option<&Record> {
        self.update.as_ref()
    }

    pub fn binder(&self) -> &Binder {
        &self.binder
    }

    /// Flattened parameters in placeholder order.
    pub fn params(&self) -> Vec<Value> {
        self.binder.params()
    }

    pub fn build_error(&self) -> Option<&str> {
        self.build_error.as_deref()
    }

    /// Switch the active command, dropping the payloads that belonged to the old one.
    pub(crate) fn switch_command(&mut self, command: Command) {
        if self.command == command {
            return;
        }
        self.command = command;
        self.insert = None;
        self.update = None;
        self.aggregate = None;
        self.binder.clear_phase(Phase::Insert);
        self.binder.clear_phase(Phase::Update);
    }

    /// Keep the first error only.
    pub(crate) fn record_error(&mut self, message: impl Into<String>) {
        if self.build_error.is_none() {
            self.build_error = Some(message.into());
        }
    }
}
