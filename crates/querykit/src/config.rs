//! Named connection configuration loaded from TOML.
//!
//! ```toml
//! default = "main"
//!
//! [connections.main]
//! driver = "sqlite"
//! database = "${APP_DB:-app.db}"
//!
//! [connections.reporting]
//! driver = "mysql"
//! host = "${DB_HOST:-localhost}"
//! port = ${DB_PORT:-3306}
//! database = "reports"
//! username = "${DB_USERNAME:-root}"
//! password = "${DB_PASSWORD:-}"
//! ```
//!
//! `${VAR}` and `${VAR:-fallback}` are expanded before the file is parsed,
//! after loading a `.env` file from the working directory if one exists.

use crate::error::{DbError, DbResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// Name of the connection used when none is named.
    pub default: String,
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConnectionConfig {
    #[serde(default = "default_driver")]
    pub driver: String,
    /// Database name, or file path for SQLite (`:memory:` for an in-memory database).
    pub database: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn default_driver() -> String {
    "sqlite".to_string()
}

impl ConnectionConfig {
    pub fn sqlite(database: impl Into<String>) -> Self {
        Self {
            driver: default_driver(),
            database: database.into(),
            host: None,
            port: None,
            username: None,
            password: None,
        }
    }
}

impl DatabaseConfig {
    /// A config with a single connection that is also the default.
    pub fn single(name: impl Into<String>, connection: ConnectionConfig) -> Self {
        let name = name.into();
        let mut connections = BTreeMap::new();
        connections.insert(name.clone(), connection);
        Self {
            default: name,
            connections,
        }
    }

    /// Read, expand and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> DbResult<Self> {
        dotenvy::dotenv().ok();

        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DbError::config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Expand, parse and validate TOML text.
    pub fn from_toml_str(raw: &str) -> DbResult<Self> {
        let expanded = expand_env_vars(raw)?;
        let config: DatabaseConfig = toml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DbResult<()> {
        if self.default.trim().is_empty() {
            return Err(DbError::config("default connection name must not be empty"));
        }
        if !self.connections.contains_key(&self.default) {
            return Err(DbError::config(format!(
                "default connection '{}' is not defined under [connections]",
                self.default
            )));
        }
        for (name, conn) in &self.connections {
            if conn.driver.trim().is_empty() {
                return Err(DbError::config(format!("connections.{name}.driver is empty")));
            }
            if conn.database.trim().is_empty() {
                return Err(DbError::config(format!("connections.{name}.database is empty")));
            }
        }
        Ok(())
    }

    pub fn connection(&self, name: &str) -> DbResult<&ConnectionConfig> {
        self.connections
            .get(name)
            .ok_or_else(|| DbError::config(format!("unknown connection '{name}'")))
    }
}

/// Replace `${VAR}` with the variable's value and `${VAR:-fallback}` with the
/// value or, when unset or empty, the fallback.
fn expand_env_vars(input: &str) -> DbResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut body = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                body.push(ch);
            }

            if !closed {
                return Err(DbError::config(format!(
                    "unterminated env var reference: ${{{body}"
                )));
            }

            let (key, fallback) = match body.split_once(":-") {
                Some((key, fallback)) => (key, Some(fallback)),
                None => (body.as_str(), None),
            };
            if key.is_empty() {
                return Err(DbError::config("invalid env var reference: ${}"));
            }

            let value = match (std::env::var(key).ok().filter(|v| !v.is_empty()), fallback) {
                (Some(v), _) => v,
                (None, Some(fallback)) => fallback.to_string(),
                (None, None) => {
                    return Err(DbError::config(format!(
                        "missing env var for config expansion: {key}"
                    )));
                }
            };
            out.push_str(&value);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}
