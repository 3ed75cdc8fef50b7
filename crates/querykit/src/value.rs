//! Bindable values and their conversions.

use crate::error::{DbError, DbResult};
use crate::expr::Expression;
use chrono::NaiveDateTime;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A value that can be bound to a placeholder or returned in a row.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    /// Rendered verbatim; never bound.
    Raw(Expression),
}

/// Type hint passed to the driver with every positional bind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    Integer,
    Text,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Value::Raw(_))
    }

    /// Type hint inferred from the native type of the value.
    pub fn param_type(&self) -> ParamType {
        match self {
            Value::Int(_) | Value::Bool(_) => ParamType::Integer,
            _ => ParamType::Text,
        }
    }

    /// Render the value as a SQL literal.
    ///
    /// Only used to produce readable diagnostic SQL; the output is never executed.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Bool(v) => (if *v { "1" } else { "0" }).to_string(),
            Value::Text(v) => quote(v),
            Value::Bytes(v) => {
                let hex: String = v.iter().map(|b| format!("{b:02X}")).collect();
                format!("X'{hex}'")
            }
            Value::Timestamp(v) => quote(&v.format(TIMESTAMP_FORMAT).to_string()),
            Value::Raw(expr) => expr.to_string(),
        }
    }

    /// Convert into a JSON value, used when deserializing rows into typed shapes.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Int(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Text(v) => serde_json::Value::String(v.clone()),
            Value::Bytes(v) => serde_json::Value::from(v.clone()),
            Value::Timestamp(v) => serde_json::Value::String(v.format(TIMESTAMP_FORMAT).to_string()),
            Value::Raw(expr) => serde_json::Value::String(expr.to_string()),
        }
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(v as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<Expression> for Value {
    fn from(v: Expression) -> Self {
        Value::Raw(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Typed extraction of a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> DbResult<Self>;
}

fn mismatch(expected: &str, got: &Value) -> DbError {
    DbError::decode("<value>", format!("expected {expected}, got {got:?}"))
}

impl FromValue for Value {
    fn from_value(value: &Value) -> DbResult<Self> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> DbResult<Self> {
        match value {
            Value::Int(v) => Ok(*v),
            Value::Bool(v) => Ok(*v as i64),
            // Drivers that return numeric aggregates as text.
            Value::Text(v) => v.trim().parse().map_err(|_| mismatch("integer", value)),
            other => Err(mismatch("integer", other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> DbResult<Self> {
        let v = i64::from_value(value)?;
        i32::try_from(v).map_err(|_| mismatch("32-bit integer", value))
    }
}

impl FromValue for u64 {
    fn from_value(value: &Value) -> DbResult<Self> {
        let v = i64::from_value(value)?;
        u64::try_from(v).map_err(|_| mismatch("unsigned integer", value))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> DbResult<Self> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            Value::Text(v) => v.trim().parse().map_err(|_| mismatch("float", value)),
            other => Err(mismatch("float", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> DbResult<Self> {
        match value {
            Value::Bool(v) => Ok(*v),
            Value::Int(v) => Ok(*v != 0),
            other => Err(mismatch("boolean", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> DbResult<Self> {
        match value {
            Value::Text(v) => Ok(v.clone()),
            Value::Raw(expr) => Ok(expr.to_string()),
            Value::Int(v) => Ok(v.to_string()),
            Value::Float(v) => Ok(v.to_string()),
            Value::Timestamp(v) => Ok(v.format(TIMESTAMP_FORMAT).to_string()),
            other => Err(mismatch("text", other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> DbResult<Self> {
        match value {
            Value::Bytes(v) => Ok(v.clone()),
            Value::Text(v) => Ok(v.as_bytes().to_vec()),
            other => Err(mismatch("bytes", other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> DbResult<Self> {
        match value {
            Value::Timestamp(v) => Ok(*v),
            Value::Text(v) => NaiveDateTime::parse_from_str(v, TIMESTAMP_FORMAT)
                .map_err(|_| mismatch("timestamp", value)),
            other => Err(mismatch("timestamp", other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> DbResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::raw;

    #[test]
    fn test_param_type_hint() {
        assert_eq!(Value::from(5).param_type(), ParamType::Integer);
        assert_eq!(Value::from(true).param_type(), ParamType::Integer);
        assert_eq!(Value::from("x").param_type(), ParamType::Text);
        assert_eq!(Value::from(1.5).param_type(), ParamType::Text);
        assert_eq!(Value::Null.param_type(), ParamType::Text);
    }

    #[test]
    fn test_sql_literal() {
        assert_eq!(Value::from(42).to_sql_literal(), "42");
        assert_eq!(Value::from(2.5).to_sql_literal(), "2.5");
        assert_eq!(Value::from("Bob").to_sql_literal(), "'Bob'");
        assert_eq!(Value::from("O'Brien").to_sql_literal(), "'O''Brien'");
        assert_eq!(Value::Null.to_sql_literal(), "NULL");
        assert_eq!(Value::from(vec![0xAB, 0x01]).to_sql_literal(), "X'AB01'");
        assert_eq!(Value::from(raw("NOW()")).to_sql_literal(), "NOW()");
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Text("a".into()));
    }

    #[test]
    fn test_from_value() {
        assert_eq!(i64::from_value(&Value::Int(3)).unwrap(), 3);
        assert_eq!(i64::from_value(&Value::Text("12".into())).unwrap(), 12);
        assert_eq!(f64::from_value(&Value::Int(2)).unwrap(), 2.0);
        assert_eq!(Option::<String>::from_value(&Value::Null).unwrap(), None);
        assert!(bool::from_value(&Value::Text("yes".into())).is_err());
    }
}
