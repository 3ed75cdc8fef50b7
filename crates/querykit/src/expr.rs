//! Literal SQL expressions.
//!
//! An [`Expression`] is copied into the rendered statement exactly as written.
//! It never becomes a `?` placeholder and never occupies a bound parameter slot,
//! which makes it the tool for things like `NOW()` or `counter + 1`:
//!
//! ```ignore
//! use querykit::{raw, Record};
//!
//! conn.table("posts")
//!     .where_eq("id", 7)
//!     .update(Record::new().set("views", raw("views + 1")).set("title", "Hello"))?;
//! // UPDATE posts SET views = views + 1, title = ? WHERE id = ?
//! ```

use std::fmt;

/// A SQL fragment rendered verbatim, without quoting or parameter binding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Expression(String);

impl Expression {
    pub fn new(sql: impl Into<String>) -> Self {
        Expression(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wrap `sql` as a literal [`Expression`].
pub fn raw(sql: impl Into<String>) -> Expression {
    Expression::new(sql)
}
