//! Statement execution, locking and transactions over one driver handle.

use crate::driver::{Cursor, Driver, DriverError, DriverStatement};
use crate::error::{DbError, DbResult};
use crate::qb::{interpolate, lock_tables_sql, unlock_tables_sql, QueryBuilder};
use crate::row::FromRow;
use crate::value::Value;
use std::cell::{RefCell, RefMut};
use std::fmt;

const SQL_TARGET: &str = "querykit.sql";

/// A named database connection.
///
/// One statement is in flight at a time. The type is `!Sync`; share it
/// across threads only behind external synchronization.
pub struct Connection {
    name: String,
    driver: RefCell<Box<dyn Driver>>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub fn new(name: impl Into<String>, driver: Box<dyn Driver>) -> Self {
        Self {
            name: name.into(),
            driver: RefCell::new(driver),
        }
    }

    /// An in-memory SQLite connection.
    #[cfg(feature = "sqlite")]
    pub fn open_in_memory(name: impl Into<String>) -> DbResult<Self> {
        let driver = crate::driver::SqliteDriver::open_in_memory()
            .map_err(|e| DbError::Connection(e.to_string()))?;
        Ok(Self::new(name, Box::new(driver)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn driver(&self) -> DbResult<RefMut<'_, Box<dyn Driver>>> {
        self.driver
            .try_borrow_mut()
            .map_err(|_| DbError::Connection(format!("connection '{}' is busy", self.name)))
    }

    /// Prepare, bind positionally, execute, then hand the statement to `read`.
    fn run<T>(
        &self,
        sql: &str,
        params: &[Value],
        read: impl FnOnce(&mut dyn DriverStatement) -> Result<T, DriverError>,
    ) -> DbResult<T> {
        let wrap = |e: DriverError| DbError::query(interpolate(sql, params), e);

        tracing::debug!(
            target: SQL_TARGET,
            connection = %self.name,
            param_count = params.len(),
            sql = %sql,
            "execute"
        );

        let mut driver = self.driver()?;
        let mut stmt = driver.prepare(sql).map_err(wrap)?;
        for (i, value) in params.iter().enumerate() {
            let hint = value.param_type();
            tracing::trace!(target: SQL_TARGET, position = i + 1, ?hint, value = ?value, "bind");
            stmt.bind(i + 1, value, hint).map_err(wrap)?;
        }
        stmt.execute().map_err(wrap)?;
        read(&mut *stmt).map_err(wrap)
    }

    /// Execute a prepared statement and return the affected-row count.
    pub fn execute(&self, sql: &str, params: &[Value]) -> DbResult<u64> {
        self.run(sql, params, |stmt| Ok(stmt.row_count()))
    }

    /// Execute and read one row at `cursor`.
    pub fn fetch_one<T: FromRow>(
        &self,
        sql: &str,
        params: &[Value],
        cursor: Cursor,
    ) -> DbResult<Option<T>> {
        let row = self.run(sql, params, |stmt| stmt.fetch_one(cursor))?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Execute and read every row.
    pub fn fetch_all<T: FromRow>(&self, sql: &str, params: &[Value]) -> DbResult<Vec<T>> {
        let rows = self.run(sql, params, |stmt| stmt.fetch_all())?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute unprepared SQL and return the affected-row count.
    pub fn exec_raw(&self, sql: &str) -> DbResult<u64> {
        tracing::debug!(target: SQL_TARGET, connection = %self.name, sql = %sql, "exec_raw");
        self.driver()?
            .exec_raw(sql)
            .map_err(|e| DbError::query(sql, e))
    }

    pub fn last_insert_id(&self) -> DbResult<i64> {
        self.driver()?
            .last_insert_id()
            .map_err(|e| DbError::Connection(e.to_string()))
    }

    /// `LOCK TABLES t1 WRITE, ...`. A no-op on drivers without table locks.
    pub fn lock_tables(&self, tables: &[&str]) -> DbResult<()> {
        if tables.is_empty() {
            return Err(DbError::invalid_usage("lock_tables requires at least one table"));
        }
        if !self.driver()?.supports_table_locks() {
            tracing::debug!(target: SQL_TARGET, connection = %self.name, ?tables, "table locks unsupported; skipped");
            return Ok(());
        }
        self.exec_raw(&lock_tables_sql(tables)).map(|_| ())
    }

    /// `UNLOCK TABLES`. A no-op on drivers without table locks.
    pub fn unlock_tables(&self) -> DbResult<()> {
        if !self.driver()?.supports_table_locks() {
            return Ok(());
        }
        self.exec_raw(unlock_tables_sql()).map(|_| ())
    }

    /// Write-lock `tables` (if any), then open a transaction.
    pub fn begin_transaction(&self, tables: &[&str]) -> DbResult<()> {
        if !tables.is_empty() {
            self.lock_tables(tables)?;
        }
        tracing::debug!(target: SQL_TARGET, connection = %self.name, "begin");
        self.driver()?
            .begin()
            .map_err(|e| DbError::query("BEGIN", e))
    }

    /// Commit, then release table locks. Fails if either step fails.
    pub fn commit(&self) -> DbResult<()> {
        tracing::debug!(target: SQL_TARGET, connection = %self.name, "commit");
        let finished = self.driver()?.commit().map_err(|e| DbError::query("COMMIT", e));
        self.finish(finished)
    }

    /// Roll back, then release table locks. Fails if either step fails.
    pub fn rollback(&self) -> DbResult<()> {
        tracing::debug!(target: SQL_TARGET, connection = %self.name, "rollback");
        let finished = self
            .driver()?
            .rollback()
            .map_err(|e| DbError::query("ROLLBACK", e));
        self.finish(finished)
    }

    // Unlock runs whatever the finish step returned.
    fn finish(&self, finished: DbResult<()>) -> DbResult<()> {
        let unlocked = self.unlock_tables();
        match (finished, unlocked) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Err(e), Err(unlock_err)) => {
                tracing::warn!(
                    target: SQL_TARGET,
                    connection = %self.name,
                    error = %unlock_err,
                    "unlock failed after failed transaction finish"
                );
                Err(e)
            }
        }
    }

    pub fn in_transaction(&self) -> bool {
        self.driver
            .try_borrow()
            .map(|d| d.in_transaction())
            .unwrap_or(false)
    }

    /// A new builder bound to this connection.
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::with_connection(self)
    }

    /// A new builder bound to this connection, targeting `table`.
    pub fn table(&self, table: &str) -> QueryBuilder<'_> {
        self.query().table(table)
    }
}
