//! Runtime value definitions
//!
//! This module provides the value type that flows between rows, model fields,
//! query parameters and hook payloads.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// PostgreSQL-compatible runtime value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PostgresValue {
    Text(String),
    Integer(i32),
    BigInt(i64),
    SmallInt(i16),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    Decimal(String), // Store as string to preserve precision
    Json(serde_json::Value),
    Bytes(Vec<u8>),
    Array(Vec<PostgresValue>),
    Record(HashMap<String, PostgresValue>), // Associative array for full records
    Null,
}

impl PostgresValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PostgresValue::Null)
    }

    /// Structured values: JSON arrays/objects, arrays and records
    pub fn is_compound(&self) -> bool {
        match self {
            PostgresValue::Json(value) => value.is_array() || value.is_object(),
            PostgresValue::Array(_) | PostgresValue::Record(_) => true,
            _ => false,
        }
    }

    /// Integer view of any integral variant
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PostgresValue::SmallInt(v) => Some(i64::from(*v)),
            PostgresValue::Integer(v) => Some(i64::from(*v)),
            PostgresValue::BigInt(v) => Some(*v),
            PostgresValue::Json(serde_json::Value::Number(n)) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PostgresValue::Text(s) | PostgresValue::Decimal(s) => Some(s),
            _ => None,
        }
    }

    /// Lossy JSON rendering, used for logging and JSON columns
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            PostgresValue::Text(s) | PostgresValue::Decimal(s) => Value::String(s.clone()),
            PostgresValue::Integer(v) => Value::from(*v),
            PostgresValue::BigInt(v) => Value::from(*v),
            PostgresValue::SmallInt(v) => Value::from(*v),
            PostgresValue::Float(v) => Value::from(*v),
            PostgresValue::Boolean(v) => Value::Bool(*v),
            PostgresValue::Uuid(v) => Value::String(v.to_string()),
            PostgresValue::Timestamp(v) => Value::String(v.to_rfc3339()),
            PostgresValue::Date(v) => Value::String(v.to_string()),
            PostgresValue::Time(v) => Value::String(v.to_string()),
            PostgresValue::Json(v) => v.clone(),
            PostgresValue::Bytes(v) => Value::Array(v.iter().map(|b| Value::from(*b)).collect()),
            PostgresValue::Array(values) => {
                Value::Array(values.iter().map(PostgresValue::to_json).collect())
            }
            PostgresValue::Record(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            PostgresValue::Null => Value::Null,
        }
    }
}

impl fmt::Display for PostgresValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostgresValue::Text(s) | PostgresValue::Decimal(s) => write!(f, "{}", s),
            PostgresValue::Integer(v) => write!(f, "{}", v),
            PostgresValue::BigInt(v) => write!(f, "{}", v),
            PostgresValue::SmallInt(v) => write!(f, "{}", v),
            PostgresValue::Float(v) => write!(f, "{}", v),
            PostgresValue::Boolean(v) => write!(f, "{}", v),
            PostgresValue::Uuid(v) => write!(f, "{}", v),
            PostgresValue::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            PostgresValue::Date(v) => write!(f, "{}", v),
            PostgresValue::Time(v) => write!(f, "{}", v),
            PostgresValue::Null => write!(f, "NULL"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<String> for PostgresValue {
    fn from(val: String) -> Self {
        PostgresValue::Text(val)
    }
}

impl From<&str> for PostgresValue {
    fn from(val: &str) -> Self {
        PostgresValue::Text(val.to_string())
    }
}

impl From<i32> for PostgresValue {
    fn from(val: i32) -> Self {
        PostgresValue::Integer(val)
    }
}

impl From<i64> for PostgresValue {
    fn from(val: i64) -> Self {
        PostgresValue::BigInt(val)
    }
}

impl From<i16> for PostgresValue {
    fn from(val: i16) -> Self {
        PostgresValue::SmallInt(val)
    }
}

impl From<f64> for PostgresValue {
    fn from(val: f64) -> Self {
        PostgresValue::Float(val)
    }
}

impl From<bool> for PostgresValue {
    fn from(val: bool) -> Self {
        PostgresValue::Boolean(val)
    }
}

impl From<Uuid> for PostgresValue {
    fn from(val: Uuid) -> Self {
        PostgresValue::Uuid(val)
    }
}

impl From<DateTime<Utc>> for PostgresValue {
    fn from(val: DateTime<Utc>) -> Self {
        PostgresValue::Timestamp(val)
    }
}

impl From<NaiveDate> for PostgresValue {
    fn from(val: NaiveDate) -> Self {
        PostgresValue::Date(val)
    }
}

impl From<NaiveTime> for PostgresValue {
    fn from(val: NaiveTime) -> Self {
        PostgresValue::Time(val)
    }
}

impl From<serde_json::Value> for PostgresValue {
    fn from(val: serde_json::Value) -> Self {
        PostgresValue::Json(val)
    }
}

impl From<Vec<u8>> for PostgresValue {
    fn from(val: Vec<u8>) -> Self {
        PostgresValue::Bytes(val)
    }
}

impl<T> From<Option<T>> for PostgresValue
where
    T: Into<PostgresValue>,
{
    fn from(val: Option<T>) -> Self {
        match val {
            Some(v) => v.into(),
            None => PostgresValue::Null,
        }
    }
}
