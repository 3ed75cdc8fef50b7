//! SQLite backend on top of `rusqlite`.

use super::{Cursor, Driver, DriverError, DriverResult, DriverStatement};
use crate::row::Row;
use crate::value::{ParamType, Value};
use rusqlite::types::{Value as SqliteValue, ValueRef};
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

fn map_err(err: rusqlite::Error) -> DriverError {
    let code = match &err {
        rusqlite::Error::SqliteFailure(e, _) => Some(format!("{:?}", e.code)),
        _ => None,
    };
    let driver_err = DriverError::new(err.to_string());
    let driver_err = match code {
        Some(code) => driver_err.with_code(code),
        None => driver_err,
    };
    driver_err.with_source(err)
}

fn to_sqlite(value: &Value) -> SqliteValue {
    match value {
        Value::Null => SqliteValue::Null,
        Value::Int(v) => SqliteValue::Integer(*v),
        Value::Float(v) => SqliteValue::Real(*v),
        Value::Bool(v) => SqliteValue::Integer(*v as i64),
        Value::Text(v) => SqliteValue::Text(v.clone()),
        Value::Bytes(v) => SqliteValue::Blob(v.clone()),
        Value::Timestamp(v) => SqliteValue::Text(v.format(TIMESTAMP_FORMAT).to_string()),
        // The builder renders these inline and never binds them.
        Value::Raw(expr) => SqliteValue::Text(expr.to_string()),
    }
}

fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Value::Bytes(v.to_vec()),
    }
}

/// A [`Driver`] over a single SQLite database file (or `:memory:`).
///
/// SQLite has no `LOCK TABLES`; transactions are opened with
/// `BEGIN IMMEDIATE`, which takes the database write lock up front.
pub struct SqliteDriver {
    conn: rusqlite::Connection,
}

impl SqliteDriver {
    pub fn open(path: impl AsRef<Path>) -> DriverResult<Self> {
        let conn = rusqlite::Connection::open(path).map_err(map_err)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> DriverResult<Self> {
        let conn = rusqlite::Connection::open_in_memory().map_err(map_err)?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// The wrapped `rusqlite` handle.
    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl std::fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDriver")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl Driver for SqliteDriver {
    fn prepare(&mut self, sql: &str) -> DriverResult<Box<dyn DriverStatement + '_>> {
        let stmt = self.conn.prepare(sql).map_err(map_err)?;
        Ok(Box::new(SqliteStatement {
            stmt,
            rows: Vec::new(),
            position: -1,
            changes: 0,
        }))
    }

    fn exec_raw(&mut self, sql: &str) -> DriverResult<u64> {
        let mut stmt = self.conn.prepare(sql).map_err(map_err)?;
        if stmt.column_count() > 0 {
            let mut rows = stmt.raw_query();
            while rows.next().map_err(map_err)?.is_some() {}
            return Ok(0);
        }
        let changes = stmt.raw_execute().map_err(map_err)?;
        Ok(changes as u64)
    }

    fn last_insert_id(&self) -> DriverResult<i64> {
        Ok(self.conn.last_insert_rowid())
    }

    fn begin(&mut self) -> DriverResult<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE").map_err(map_err)
    }

    fn commit(&mut self) -> DriverResult<()> {
        self.conn.execute_batch("COMMIT").map_err(map_err)
    }

    fn rollback(&mut self) -> DriverResult<()> {
        self.conn.execute_batch("ROLLBACK").map_err(map_err)
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn supports_table_locks(&self) -> bool {
        false
    }
}

struct SqliteStatement<'conn> {
    stmt: rusqlite::Statement<'conn>,
    rows: Vec<Row>,
    /// Index of the current row; -1 before the first.
    position: isize,
    changes: u64,
}

impl SqliteStatement<'_> {
    fn seek(&mut self, target: isize) -> Option<Row> {
        let len = self.rows.len() as isize;
        self.position = target.clamp(-1, len);
        if (0..len).contains(&target) {
            Some(self.rows[target as usize].clone())
        } else {
            None
        }
    }
}

impl DriverStatement for SqliteStatement<'_> {
    fn bind(&mut self, position: usize, value: &Value, _hint: ParamType) -> DriverResult<()> {
        // SQLite is dynamically typed; the stored value already carries its type.
        self.stmt
            .raw_bind_parameter(position, to_sqlite(value))
            .map_err(map_err)
    }

    fn execute(&mut self) -> DriverResult<()> {
        self.rows.clear();
        self.position = -1;
        self.changes = 0;

        if self.stmt.column_count() == 0 {
            self.changes = self.stmt.raw_execute().map_err(map_err)? as u64;
            return Ok(());
        }

        let columns: Vec<String> = self
            .stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let width = columns.len();

        let mut rows = self.stmt.raw_query();
        while let Some(row) = rows.next().map_err(map_err)? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_sqlite(row.get_ref(i).map_err(map_err)?));
            }
            self.rows.push(Row::new(columns.clone(), values));
        }
        Ok(())
    }

    fn fetch_one(&mut self, cursor: Cursor) -> DriverResult<Option<Row>> {
        let target = match cursor {
            Cursor::Next => self.position + 1,
            Cursor::Prior => self.position - 1,
            Cursor::First => 0,
            Cursor::Last => self.rows.len() as isize - 1,
            Cursor::Absolute(n) => n as isize,
            Cursor::Relative(n) => self.position + n,
        };
        Ok(self.seek(target))
    }

    fn fetch_all(&mut self) -> DriverResult<Vec<Row>> {
        let start = (self.position + 1).max(0) as usize;
        let rest = self.rows.get(start..).map(<[Row]>::to_vec).unwrap_or_default();
        self.position = self.rows.len() as isize;
        Ok(rest)
    }

    fn row_count(&self) -> u64 {
        self.changes
    }
}
