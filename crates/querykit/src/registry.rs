//! Named, lazily created connections.

use crate::config::{ConnectionConfig, DatabaseConfig};
use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::{DbError, DbResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Opens a driver for one configured connection.
pub type DriverFactory = Box<dyn Fn(&str, &ConnectionConfig) -> DbResult<Box<dyn Driver>>>;

/// Owns the connection config and caches one [`Connection`] per name.
///
/// ```ignore
/// let registry = ConnectionRegistry::new(DatabaseConfig::load("database.toml")?);
/// let users = registry.default_connection()?.table("users").get()?;
///
/// registry.set_current("reports")?;
/// let total = registry.current()?.table("sales").sum("amount")?;
/// ```
pub struct ConnectionRegistry {
    config: DatabaseConfig,
    factory: DriverFactory,
    cache: RefCell<HashMap<String, Rc<Connection>>>,
    current: RefCell<Option<String>>,
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("config", &self.config)
            .field("current", &self.current.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "sqlite")]
fn open_builtin(name: &str, config: &ConnectionConfig) -> DbResult<Box<dyn Driver>> {
    use crate::driver::SqliteDriver;

    match config.driver.as_str() {
        "sqlite" => {
            let driver = if config.database == ":memory:" {
                SqliteDriver::open_in_memory()
            } else {
                SqliteDriver::open(&config.database)
            };
            let driver = driver.map_err(|e| {
                DbError::Connection(format!("failed to open connection '{name}': {e}"))
            })?;
            Ok(Box::new(driver))
        }
        other => Err(DbError::config(format!(
            "connection '{name}' uses driver '{other}', which has no built-in backend"
        ))),
    }
}

#[cfg(not(feature = "sqlite"))]
fn open_builtin(name: &str, config: &ConnectionConfig) -> DbResult<Box<dyn Driver>> {
    Err(DbError::config(format!(
        "connection '{name}' uses driver '{}', which has no built-in backend",
        config.driver
    )))
}

impl ConnectionRegistry {
    /// A registry that opens connections with the built-in backends.
    pub fn new(config: DatabaseConfig) -> Self {
        Self::with_factory(config, open_builtin)
    }

    /// A registry that opens connections with `factory`.
    pub fn with_factory<F>(config: DatabaseConfig, factory: F) -> Self
    where
        F: Fn(&str, &ConnectionConfig) -> DbResult<Box<dyn Driver>> + 'static,
    {
        Self {
            config,
            factory: Box::new(factory),
            cache: RefCell::new(HashMap::new()),
            current: RefCell::new(None),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    fn open(&self, name: &str) -> DbResult<Rc<Connection>> {
        let config = self.config.connection(name)?;
        let driver = (self.factory)(name, config)?;
        tracing::debug!(target: "querykit.sql", connection = name, driver = %config.driver, "open");
        let conn = Rc::new(Connection::new(name, driver));
        self.cache
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&conn));
        Ok(conn)
    }

    /// The cached connection for `name`, opening it on first use.
    pub fn connection(&self, name: &str) -> DbResult<Rc<Connection>> {
        if let Some(conn) = self.cache.borrow().get(name) {
            return Ok(Rc::clone(conn));
        }
        self.open(name)
    }

    /// Open a fresh connection for `name`, replacing the cached one.
    ///
    /// Holders of the previous `Rc` keep using the old handle.
    pub fn reconnect(&self, name: &str) -> DbResult<Rc<Connection>> {
        self.open(name)
    }

    pub fn default_connection(&self) -> DbResult<Rc<Connection>> {
        self.connection(&self.config.default)
    }

    /// Make `name` the connection returned by [`current`](Self::current).
    pub fn set_current(&self, name: &str) -> DbResult<()> {
        if !self.config.connections.contains_key(name) {
            return Err(DbError::config(format!("unknown connection '{name}'")));
        }
        *self.current.borrow_mut() = Some(name.to_string());
        Ok(())
    }

    /// The current connection; the default one until `set_current` is called.
    pub fn current(&self) -> DbResult<Rc<Connection>> {
        let name = self
            .current
            .borrow()
            .clone()
            .unwrap_or_else(|| self.config.default.clone());
        self.connection(&name)
    }

    pub fn is_open(&self, name: &str) -> bool {
        self.cache.borrow().contains_key(name)
    }
}
