//! Clause types held by the builder before rendering.

use crate::error::DbError;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// The statement a builder describes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Command {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
}

/// How a predicate joins the one before it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl Logic {
    pub fn as_str(self) -> &'static str {
        match self {
            Logic::And => "AND",
            Logic::Or => "OR",
        }
    }
}

/// Comparison operator of a structured predicate or join condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
    /// `<>`
    Ne,
    /// `!=`
    NotEq,
    Like,
    NotLike,
    ILike,
    NotILike,
}

impl Op {
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Ne => "<>",
            Op::NotEq => "!=",
            Op::Like => "LIKE",
            Op::NotLike => "NOT LIKE",
            Op::ILike => "ILIKE",
            Op::NotILike => "NOT ILIKE",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Op {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_uppercase().as_str() {
            "=" => Ok(Op::Eq),
            "<" => Ok(Op::Lt),
            "<=" => Ok(Op::Lte),
            ">" => Ok(Op::Gt),
            ">=" => Ok(Op::Gte),
            "<>" => Ok(Op::Ne),
            "!=" => Ok(Op::NotEq),
            "LIKE" => Ok(Op::Like),
            "NOT LIKE" => Ok(Op::NotLike),
            "ILIKE" => Ok(Op::ILike),
            "NOT ILIKE" => Ok(Op::NotILike),
            _ => Err(DbError::invalid_usage(format!(
                "unsupported comparison operator: {s:?}"
            ))),
        }
    }
}

/// One predicate of the WHERE clause.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Verbatim SQL fragment.
    Raw(String),
    Compare {
        column: String,
        op: Op,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    Between {
        column: String,
        low: Value,
        high: Value,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct WhereEntry {
    /// Connector to the previous entry; ignored on the first one.
    pub logic: Logic,
    pub predicate: Predicate,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Join {
    /// `<KIND> JOIN <sql>`
    Raw { kind: JoinKind, sql: String },
    /// `<KIND> JOIN <table> ON <left> <op> <right>`
    On {
        kind: JoinKind,
        table: String,
        left: String,
        op: Op,
        right: String,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFn {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregateFn::Count => "COUNT",
            AggregateFn::Sum => "SUM",
            AggregateFn::Avg => "AVG",
            AggregateFn::Min => "MIN",
            AggregateFn::Max => "MAX",
        }
    }
}

/// Aggregate projection; replaces the column list when set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Aggregate {
    pub func: AggregateFn,
    pub column: String,
}

/// An ordered column => value mapping used as an INSERT row or UPDATE payload.
///
/// Columns keep their first insertion position; setting a column again
/// replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column (builder form).
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.put(column, value);
        self
    }

    /// Set a column in place.
    pub fn put(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Union of `self` and `other`; values from `other` win on shared columns.
    pub fn merge(mut self, other: Record) -> Self {
        for (column, value) in other.entries {
            self.put(column, value);
        }
        self
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.put(k, v);
        }
        record
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Record {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Normalized INSERT payload stored in the query state.
#[derive(Clone, Debug, PartialEq)]
pub enum InsertSource {
    /// One value group per row, each ordered like `columns`.
    Values {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    /// `INSERT INTO t (columns) <query>`
    Select {
        columns: Vec<String>,
        query: Box<super::QueryState>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_parse() {
        assert_eq!("=".parse::<Op>().unwrap(), Op::Eq);
        assert_eq!("not  like".parse::<Op>().unwrap(), Op::NotLike);
        assert_eq!(" >= ".parse::<Op>().unwrap(), Op::Gte);
        assert!("=>".parse::<Op>().unwrap_err().is_invalid_usage());
    }

    #[test]
    fn test_record_keeps_first_position() {
        let r = Record::new().set("a", 1).set("b", 2).set("a", 3);
        assert_eq!(r.columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(r.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_record_merge() {
        let search = Record::from([("email", "a@x.io")]);
        let update = Record::from([("name", "Ana"), ("email", "b@x.io")]);
        let merged = search.merge(update);
        assert_eq!(merged.columns().collect::<Vec<_>>(), vec!["email", "name"]);
        assert_eq!(merged.get("email"), Some(&Value::from("b@x.io")));
    }
}
