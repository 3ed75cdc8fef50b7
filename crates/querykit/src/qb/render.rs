//! Pure rendering of a [`QueryState`] into SQL text.
//!
//! Identifiers are emitted exactly as given (never quoted). Every bound value
//! renders as a single `?`; literal expressions render verbatim.

use super::clause::{Command, InsertSource, Join, Predicate};
use super::state::QueryState;
use crate::error::{DbError, DbResult};
use crate::value::Value;

/// Column alias of the aggregate projection.
pub const AGGREGATE_ALIAS: &str = "valor";

/// Render the active command of `state`.
pub fn render(state: &QueryState) -> DbResult<String> {
    if let Some(err) = state.build_error() {
        return Err(DbError::invalid_usage(err));
    }
    match state.command() {
        Command::Select => render_select(state),
        Command::Insert => render_insert(state),
        Command::Update => render_update(state),
        Command::Delete => render_delete(state),
    }
}

/// Substitute every `?` with the SQL literal of the matching parameter.
///
/// The result is for diagnostics only and is never executed. A `?` inside a
/// single-quoted literal is not a placeholder. Placeholders beyond the end of
/// `params` are left as they are.
pub fn interpolate(sql: &str, params: &[Value]) -> String {
    let mut out = String::with_capacity(sql.len() + params.len() * 8);
    let mut params = params.iter();
    let mut in_literal = false;
    for ch in sql.chars() {
        // A doubled '' inside a literal toggles twice, so it stays in.
        if ch == '\'' {
            in_literal = !in_literal;
        }
        if ch != '?' || in_literal {
            out.push(ch);
            continue;
        }
        match params.next() {
            Some(value) => out.push_str(&value.to_sql_literal()),
            None => out.push('?'),
        }
    }
    out
}

/// `LOCK TABLES t1 WRITE, t2 WRITE`
pub fn lock_tables_sql(tables: &[&str]) -> String {
    let list = tables
        .iter()
        .map(|t| format!("{t} WRITE"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("LOCK TABLES {list}")
}

pub fn unlock_tables_sql() -> &'static str {
    "UNLOCK TABLES"
}

fn placeholder(value: &Value) -> String {
    match value {
        Value::Raw(expr) => expr.to_string(),
        _ => "?".to_string(),
    }
}

fn placeholders<'a>(values: impl IntoIterator<Item = &'a Value>) -> String {
    values
        .into_iter()
        .map(placeholder)
        .collect::<Vec<_>>()
        .join(", ")
}

fn require_table<'a>(table: Option<&'a str>, command: &str) -> DbResult<&'a str> {
    match table {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(DbError::invalid_usage(format!(
            "{command} requires a table; call table() first"
        ))),
    }
}

fn render_select(state: &QueryState) -> DbResult<String> {
    let from = require_table(state.from().or(state.table()), "SELECT")?;

    let projection = match state.aggregate() {
        Some(agg) => {
            let distinct = if state.is_distinct() && agg.column != "*" {
                "DISTINCT "
            } else {
                ""
            };
            format!(
                "{}({distinct}{}) AS {AGGREGATE_ALIAS}",
                agg.func.as_str(),
                agg.column
            )
        }
        None => {
            let columns = if state.columns().is_empty() {
                "*".to_string()
            } else {
                state.columns().join(", ")
            };
            if state.is_distinct() {
                format!("DISTINCT {columns}")
            } else {
                columns
            }
        }
    };

    let mut parts = vec![format!("SELECT {projection} FROM {from}")];
    parts.extend(render_joins(state));
    parts.extend(render_where(state));
    if !state.group_by().is_empty() {
        parts.push(format!("GROUP BY {}", state.group_by().join(", ")));
    }
    if !state.order_by().is_empty() {
        let order = state
            .order_by()
            .iter()
            .map(|o| format!("{} {}", o.column, o.direction.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("ORDER BY {order}"));
    }
    if let Some(limit) = state.limit() {
        parts.push(format!("LIMIT {limit}"));
    }
    if let Some(offset) = state.offset() {
        parts.push(format!("OFFSET {offset}"));
    }
    Ok(parts.join(" "))
}

fn render_insert(state: &QueryState) -> DbResult<String> {
    let table = require_table(state.table(), "INSERT")?;
    if !state.wheres().is_empty() {
        return Err(DbError::invalid_usage("INSERT cannot carry WHERE predicates"));
    }
    match state.insert_source() {
        None => Err(DbError::invalid_usage("INSERT requires a payload")),
        Some(InsertSource::Values { columns, rows }) => {
            if columns.is_empty() || rows.is_empty() {
                return Err(DbError::invalid_usage("INSERT requires at least one column"));
            }
            let groups = rows
                .iter()
                .map(|row| format!("({})", placeholders(row)))
                .collect::<Vec<_>>()
                .join(", ");
            Ok(format!(
                "INSERT INTO {table} ({}) VALUES {groups}",
                columns.join(", ")
            ))
        }
        Some(InsertSource::Select { columns, query }) => {
            let select = render(query)?;
            Ok(format!("INSERT INTO {table} ({}) {select}", columns.join(", ")))
        }
    }
}

fn render_update(state: &QueryState) -> DbResult<String> {
    let table = require_table(state.table(), "UPDATE")?;
    let payload = match state.update_payload() {
        Some(p) if !p.is_empty() => p,
        _ => return Err(DbError::invalid_usage("UPDATE requires at least one column to set")),
    };
    let set = payload
        .iter()
        .map(|(column, value)| format!("{column} = {}", placeholder(value)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut parts = vec![format!("UPDATE {table}")];
    parts.extend(render_joins(state));
    parts.push(format!("SET {set}"));
    parts.extend(render_where(state));
    Ok(parts.join(" "))
}

fn render_delete(state: &QueryState) -> DbResult<String> {
    let table = require_table(state.table(), "DELETE")?;
    let mut parts = vec![format!("DELETE FROM {table}")];
    parts.extend(render_joins(state));
    parts.extend(render_where(state));
    Ok(parts.join(" "))
}

fn render_joins(state: &QueryState) -> Option<String> {
    if state.joins().is_empty() {
        return None;
    }
    let joins = state
        .joins()
        .iter()
        .map(|join| match join {
            Join::Raw { kind, sql } => format!("{} {sql}", kind.keyword()),
            Join::On {
                kind,
                table,
                left,
                op,
                right,
            } => format!("{} {table} ON {left} {op} {right}", kind.keyword()),
        })
        .collect::<Vec<_>>();
    Some(joins.join(" "))
}

fn render_where(state: &QueryState) -> Option<String> {
    if state.wheres().is_empty() {
        return None;
    }
    let mut sql = String::from("WHERE ");
    for (i, entry) in state.wheres().iter().enumerate() {
        if i > 0 {
            sql.push(' ');
            sql.push_str(entry.logic.as_str());
            sql.push(' ');
        }
        sql.push_str(&render_predicate(&entry.predicate));
    }
    Some(sql)
}

fn render_predicate(predicate: &Predicate) -> String {
    match predicate {
        Predicate::Raw(sql) => sql.clone(),
        Predicate::Compare { column, op, value } => {
            format!("{column} {op} {}", placeholder(value))
        }
        Predicate::In {
            values, negated, ..
        } if values.is_empty() => {
            // Nothing is IN an empty list; everything is NOT IN it.
            let sql = if *negated { "1=1" } else { "1=0" };
            sql.to_string()
        }
        Predicate::In {
            column,
            values,
            negated,
        } => {
            let keyword = if *negated { "NOT IN" } else { "IN" };
            format!("{column} {keyword} ({})", placeholders(values))
        }
        Predicate::Between { column, low, high } => {
            format!(
                "{column} BETWEEN {} AND {}",
                placeholder(low),
                placeholder(high)
            )
        }
    }
}
