//! The fluent query builder.

use super::clause::{
    Aggregate, AggregateFn, Command, Direction, InsertSource, Join, JoinKind, Logic, Op, OrderBy,
    Predicate, Record, WhereEntry,
};
use super::param::Phase;
use super::render::{self, AGGREGATE_ALIAS};
use super::state::QueryState;
use super::BuiltQuery;
use crate::connection::Connection;
use crate::driver::Cursor;
use crate::error::{DbError, DbResult};
use crate::row::{FromRow, Row};
use crate::value::Value;
use std::fmt;

type Producer<'c> = Box<dyn FnOnce(QueryBuilder<'c>) -> QueryBuilder<'c> + 'c>;

/// What an INSERT writes.
pub enum InsertPayload<'c> {
    /// One row.
    Row(Record),
    /// Several rows; the column list comes from the first one.
    Rows(Vec<Record>),
    /// `INSERT INTO t (columns) SELECT ...`, with the SELECT described by `producer`.
    Select {
        columns: Vec<String>,
        producer: Producer<'c>,
    },
}

impl<'c> InsertPayload<'c> {
    /// INSERT from a sub-query.
    ///
    /// `producer` receives a fresh builder on the same connection and returns
    /// the configured SELECT. It runs once, when the insert is staged.
    pub fn select<I, S, F>(columns: I, producer: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(QueryBuilder<'c>) -> QueryBuilder<'c> + 'c,
    {
        InsertPayload::Select {
            columns: columns.into_iter().map(Into::into).collect(),
            producer: Box::new(producer),
        }
    }
}

impl fmt::Debug for InsertPayload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertPayload::Row(r) => f.debug_tuple("Row").field(r).finish(),
            InsertPayload::Rows(rs) => f.debug_tuple("Rows").field(rs).finish(),
            InsertPayload::Select { columns, .. } => f
                .debug_struct("Select")
                .field("columns", columns)
                .field("producer", &"<fn>")
                .finish(),
        }
    }
}

impl From<Record> for InsertPayload<'_> {
    fn from(record: Record) -> Self {
        InsertPayload::Row(record)
    }
}

impl From<Vec<Record>> for InsertPayload<'_> {
    fn from(records: Vec<Record>) -> Self {
        InsertPayload::Rows(records)
    }
}

/// Result of [`QueryBuilder::update_or_insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A matching row existed; carries the affected-row count.
    Updated(u64),
    /// Nothing matched; carries the generated identifier (0 if none).
    Inserted(i64),
}

/// Fluent accumulator of one statement.
///
/// A builder created through [`Connection::query`] or [`Connection::table`]
/// can execute itself; one created with [`QueryBuilder::new`] can only render.
///
/// ```ignore
/// let rows = conn
///     .table("users")
///     .select(["id", "name"])
///     .where_eq("active", true)
///     .where_op("age", ">=", 18)
///     .order_by_desc("created_at")
///     .limit(20)
///     .get()?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct QueryBuilder<'c> {
    conn: Option<&'c Connection>,
    state: QueryState,
}

impl QueryBuilder<'static> {
    /// A builder with no connection, for rendering only.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'c> QueryBuilder<'c> {
    pub fn with_connection(conn: &'c Connection) -> Self {
        Self {
            conn: Some(conn),
            state: QueryState::default(),
        }
    }

    /// A fresh builder sharing only this builder's connection.
    pub fn new_query(&self) -> QueryBuilder<'c> {
        QueryBuilder {
            conn: self.conn,
            state: QueryState::default(),
        }
    }

    pub fn connection(&self) -> Option<&'c Connection> {
        self.conn
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    // ==================== Projection / target ====================

    /// Set the projection; an empty list selects `*`.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn select_all(mut self) -> Self {
        self.state.columns.clear();
        self
    }

    pub fn select_distinct<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select(columns).distinct(true)
    }

    pub fn distinct(mut self, distinct: bool) -> Self {
        self.state.distinct = distinct;
        self
    }

    /// Set the table the statement targets (and reads FROM).
    pub fn table(mut self, table: &str) -> Self {
        self.state.table = Some(table.to_string());
        self.state.from = Some(table.to_string());
        self
    }

    /// Override only the SELECT FROM target.
    pub fn from(mut self, from: &str) -> Self {
        self.state.from = Some(from.to_string());
        self
    }

    // ==================== WHERE ====================

    fn push_where(&mut self, logic: Logic, predicate: Predicate) {
        match &predicate {
            Predicate::Raw(_) => {}
            Predicate::Compare { value, .. } => {
                self.state.binder.add_param(Phase::Where, value.clone());
            }
            Predicate::In { values, .. } => {
                self.state.binder.add_params(Phase::Where, values.iter().cloned());
            }
            Predicate::Between { low, high, .. } => {
                self.state.binder.add_param(Phase::Where, low.clone());
                self.state.binder.add_param(Phase::Where, high.clone());
            }
        }
        self.state.wheres.push(WhereEntry { logic, predicate });
    }

    fn push_compare(mut self, logic: Logic, column: &str, op: &str, value: Value) -> Self {
        match op.parse::<Op>() {
            Ok(op) => self.push_where(
                logic,
                Predicate::Compare {
                    column: column.to_string(),
                    op,
                    value,
                },
            ),
            Err(_) => self
                .state
                .record_error(format!("unsupported comparison operator {op:?} on {column}")),
        }
        self
    }

    fn push_in<I>(mut self, logic: Logic, column: &str, values: I, negated: bool) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.push_where(
            logic,
            Predicate::In {
                column: column.to_string(),
                values,
                negated,
            },
        );
        self
    }

    fn push_between(mut self, logic: Logic, column: &str, low: Value, high: Value) -> Self {
        self.push_where(
            logic,
            Predicate::Between {
                column: column.to_string(),
                low,
                high,
            },
        );
        self
    }

    /// `column = ?`
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_compare(Logic::And, column, "=", value.into())
    }

    /// `column <op> ?`; `op` is one of `= < <= > >= <> != LIKE, NOT LIKE, ILIKE, NOT ILIKE`.
    pub fn where_op(self, column: &str, op: &str, value: impl Into<Value>) -> Self {
        self.push_compare(Logic::And, column, op, value.into())
    }

    pub fn or_where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_compare(Logic::Or, column, "=", value.into())
    }

    pub fn or_where_op(self, column: &str, op: &str, value: impl Into<Value>) -> Self {
        self.push_compare(Logic::Or, column, op, value.into())
    }

    /// Verbatim predicate; binds nothing.
    pub fn where_raw(mut self, sql: &str) -> Self {
        self.push_where(Logic::And, Predicate::Raw(sql.to_string()));
        self
    }

    pub fn or_where_raw(mut self, sql: &str) -> Self {
        self.push_where(Logic::Or, Predicate::Raw(sql.to_string()));
        self
    }

    /// `column IN (?, ?, ...)`, one placeholder per element.
    pub fn where_in<I>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.push_in(Logic::And, column, values, false)
    }

    pub fn where_not_in<I>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.push_in(Logic::And, column, values, true)
    }

    pub fn or_where_in<I>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.push_in(Logic::Or, column, values, false)
    }

    pub fn or_where_not_in<I>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.push_in(Logic::Or, column, values, true)
    }

    /// `column BETWEEN ? AND ?`, bound as (low, high) without reordering.
    pub fn where_between(self, column: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.push_between(Logic::And, column, low.into(), high.into())
    }

    pub fn or_where_between(
        self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.push_between(Logic::Or, column, low.into(), high.into())
    }

    // ==================== JOIN ====================

    fn push_join(mut self, kind: JoinKind, table: &str, left: &str, op: &str, right: &str) -> Self {
        match op.parse::<Op>() {
            Ok(op) => self.state.joins.push(Join::On {
                kind,
                table: table.to_string(),
                left: left.to_string(),
                op,
                right: right.to_string(),
            }),
            Err(_) => self
                .state
                .record_error(format!("unsupported join operator {op:?} on {table}")),
        }
        self
    }

    fn push_join_raw(mut self, kind: JoinKind, sql: &str) -> Self {
        self.state.joins.push(Join::Raw {
            kind,
            sql: sql.to_string(),
        });
        self
    }

    /// `JOIN table ON left = right`
    pub fn join(self, table: &str, left: &str, right: &str) -> Self {
        self.push_join(JoinKind::Inner, table, left, "=", right)
    }

    pub fn join_op(self, table: &str, left: &str, op: &str, right: &str) -> Self {
        self.push_join(JoinKind::Inner, table, left, op, right)
    }

    pub fn left_join(self, table: &str, left: &str, right: &str) -> Self {
        self.push_join(JoinKind::Left, table, left, "=", right)
    }

    pub fn left_join_op(self, table: &str, left: &str, op: &str, right: &str) -> Self {
        self.push_join(JoinKind::Left, table, left, op, right)
    }

    pub fn right_join(self, table: &str, left: &str, right: &str) -> Self {
        self.push_join(JoinKind::Right, table, left, "=", right)
    }

    pub fn right_join_op(self, table: &str, left: &str, op: &str, right: &str) -> Self {
        self.push_join(JoinKind::Right, table, left, op, right)
    }

    /// `JOIN <sql>`
    pub fn join_raw(self, sql: &str) -> Self {
        self.push_join_raw(JoinKind::Inner, sql)
    }

    pub fn left_join_raw(self, sql: &str) -> Self {
        self.push_join_raw(JoinKind::Left, sql)
    }

    pub fn right_join_raw(self, sql: &str) -> Self {
        self.push_join_raw(JoinKind::Right, sql)
    }

    // ==================== GROUP / ORDER / LIMIT ====================

    /// Replace the GROUP BY list.
    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.group_by = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Append an ORDER BY entry; repeated calls accumulate.
    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.state.order_by.push(OrderBy {
            column: column.to_string(),
            direction,
        });
        self
    }

    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, Direction::Asc)
    }

    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, Direction::Desc)
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.state.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.state.offset = Some(offset);
        self
    }

    /// Drop every bound parameter, keeping the clauses.
    pub fn clear_params(mut self) -> Self {
        self.state.binder.clear();
        self
    }

    // ==================== Rendering ====================

    /// Render the active command.
    pub fn to_sql(&self) -> DbResult<String> {
        render::render(&self.state)
    }

    /// Render with every placeholder replaced by its value. Diagnostic only.
    pub fn to_interpolated_sql(&self) -> DbResult<String> {
        let sql = self.to_sql()?;
        Ok(render::interpolate(&sql, &self.state.params()))
    }

    /// Flattened parameters in placeholder order.
    pub fn params(&self) -> Vec<Value> {
        self.state.params()
    }

    pub fn build(&self) -> DbResult<BuiltQuery> {
        Ok(BuiltQuery {
            sql: self.to_sql()?,
            params: self.params(),
        })
    }

    fn require_connection(&self) -> DbResult<&'c Connection> {
        self.conn.ok_or_else(|| {
            DbError::invalid_usage("builder has no connection; create it with Connection::query()")
        })
    }

    // ==================== Reads ====================

    /// Every matching row.
    pub fn get(&self) -> DbResult<Vec<Row>> {
        self.get_as()
    }

    pub fn get_as<T: FromRow>(&self) -> DbResult<Vec<T>> {
        let conn = self.require_connection()?;
        let built = self.build()?;
        conn.fetch_all(&built.sql, &built.params)
    }

    /// The first row of the result, if any. Adds no LIMIT.
    pub fn first(&self) -> DbResult<Option<Row>> {
        self.first_as()
    }

    pub fn first_as<T: FromRow>(&self) -> DbResult<Option<T>> {
        let conn = self.require_connection()?;
        let built = self.build()?;
        conn.fetch_one(&built.sql, &built.params, Cursor::Next)
    }

    /// `WHERE column = value`, first row.
    pub fn find(self, column: &str, value: impl Into<Value>) -> DbResult<Option<Row>> {
        self.where_eq(column, value).first()
    }

    // ==================== Aggregates ====================

    fn stage_aggregate(mut self, func: AggregateFn, column: &str) -> Self {
        self.state.switch_command(Command::Select);
        self.state.aggregate = Some(Aggregate {
            func,
            column: column.to_string(),
        });
        self
    }

    /// Render an aggregate without executing it.
    pub fn aggregate_sql(self, func: AggregateFn, column: &str) -> DbResult<BuiltQuery> {
        self.stage_aggregate(func, column).build()
    }

    /// Run `FUNC(column) AS valor` and return its value.
    ///
    /// Returns `None` when no row comes back or the aggregate is NULL.
    pub fn aggregate(self, func: AggregateFn, column: &str) -> DbResult<Option<Value>> {
        let query = self.stage_aggregate(func, column);
        let row = query.first()?;
        Ok(row
            .and_then(|r| r.get(AGGREGATE_ALIAS).cloned())
            .filter(|v| !v.is_null()))
    }

    pub fn count(self, column: &str) -> DbResult<Option<Value>> {
        self.aggregate(AggregateFn::Count, column)
    }

    pub fn sum(self, column: &str) -> DbResult<Option<Value>> {
        self.aggregate(AggregateFn::Sum, column)
    }

    pub fn avg(self, column: &str) -> DbResult<Option<Value>> {
        self.aggregate(AggregateFn::Avg, column)
    }

    pub fn min(self, column: &str) -> DbResult<Option<Value>> {
        self.aggregate(AggregateFn::Min, column)
    }

    pub fn max(self, column: &str) -> DbResult<Option<Value>> {
        self.aggregate(AggregateFn::Max, column)
    }

    // ==================== Mutations ====================

    fn stage_insert(mut self, payload: InsertPayload<'c>) -> DbResult<Self> {
        self.state.switch_command(Command::Insert);
        self.state.binder.clear_phase(Phase::Insert);

        let source = match payload {
            InsertPayload::Row(record) => rows_source(vec![record])?,
            InsertPayload::Rows(records) => rows_source(records)?,
            InsertPayload::Select { columns, producer } => {
                let sub = producer(self.new_query()).state;
                if let Some(err) = sub.build_error() {
                    return Err(DbError::invalid_usage(format!(
                        "INSERT ... SELECT sub-query: {err}"
                    )));
                }
                if sub.command() != Command::Select {
                    return Err(DbError::invalid_usage(
                        "INSERT ... SELECT producer must describe a SELECT",
                    ));
                }
                // Sub-query placeholders sit where the VALUES would be.
                self.state.binder.add_params(Phase::Insert, sub.params());
                InsertSource::Select {
                    columns,
                    query: Box::new(sub),
                }
            }
        };

        if let InsertSource::Values { rows, .. } = &source {
            for row in rows {
                self.state.binder.add_params(Phase::Insert, row.iter().cloned());
            }
        }
        self.state.insert = Some(source);
        Ok(self)
    }

    /// Render an INSERT without executing it.
    pub fn insert_sql(self, payload: impl Into<InsertPayload<'c>>) -> DbResult<BuiltQuery> {
        self.stage_insert(payload.into())?.build()
    }

    /// Execute an INSERT and return the last generated identifier (0 if none).
    pub fn insert(self, payload: impl Into<InsertPayload<'c>>) -> DbResult<i64> {
        let query = self.stage_insert(payload.into())?;
        let conn = query.require_connection()?;
        let built = query.build()?;
        conn.execute(&built.sql, &built.params)?;
        conn.last_insert_id()
    }

    fn stage_update(mut self, data: Record) -> Self {
        self.state.switch_command(Command::Update);
        self.state.binder.clear_phase(Phase::Update);
        self.state.binder.add_params(Phase::Update, data.values().cloned());
        self.state.update = Some(data);
        self
    }

    /// Render an UPDATE without executing it.
    pub fn update_sql(self, data: Record) -> DbResult<BuiltQuery> {
        self.stage_update(data).build()
    }

    /// Execute an UPDATE and return the affected-row count.
    pub fn update(self, data: Record) -> DbResult<u64> {
        let query = self.stage_update(data);
        let conn = query.require_connection()?;
        let built = query.build()?;
        conn.execute(&built.sql, &built.params)
    }

    /// Render a DELETE without executing it.
    pub fn delete_sql(mut self) -> DbResult<BuiltQuery> {
        self.state.switch_command(Command::Delete);
        self.build()
    }

    /// Execute a DELETE and return the affected-row count.
    pub fn delete(mut self) -> DbResult<u64> {
        self.state.switch_command(Command::Delete);
        let conn = self.require_connection()?;
        let built = self.build()?;
        conn.execute(&built.sql, &built.params)
    }

    /// Update the rows matching `search`, or insert `search` merged with `update`.
    pub fn update_or_insert(self, search: Record, update: Record) -> DbResult<UpsertOutcome> {
        let mut query = self;
        for (column, value) in search.iter() {
            query = query.where_eq(column, value.clone());
        }

        if query.first()?.is_some() {
            return query.update(update).map(UpsertOutcome::Updated);
        }

        let mut fresh = query.new_query();
        if let Some(table) = query.state.table() {
            fresh = fresh.table(table);
        }
        fresh.insert(search.merge(update)).map(UpsertOutcome::Inserted)
    }
}

/// Normalize literal rows: columns from the first row, every row reordered to match.
fn rows_source(records: Vec<Record>) -> DbResult<InsertSource> {
    let Some(first) = records.first() else {
        return Err(DbError::invalid_usage("INSERT requires at least one row"));
    };
    if first.is_empty() {
        return Err(DbError::invalid_usage("INSERT requires at least one column"));
    }
    let columns: Vec<String> = first.columns().map(str::to_string).collect();

    let mut rows = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        if record.len() != columns.len() {
            return Err(DbError::invalid_usage(format!(
                "INSERT row {i} has {} columns, expected {}",
                record.len(),
                columns.len()
            )));
        }
        let mut row = Vec::with_capacity(columns.len());
        for column in &columns {
            let value = record.get(column).ok_or_else(|| {
                DbError::invalid_usage(format!("INSERT row {i} is missing column {column}"))
            })?;
            row.push(value.clone());
        }
        rows.push(row);
    }
    Ok(InsertSource::Values { columns, rows })
}
