//! Conversions between Rust field types and `PostgresValue`
//!
//! Model accessors use these to read and write struct fields generically.

use crate::errors::CoercionError;
use crate::types::PostgresValue;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

/// A Rust type that can live in a model field
pub trait FieldValue: Sized {
    fn to_value(&self) -> PostgresValue;
    fn from_value(value: PostgresValue) -> Result<Self, CoercionError>;
}

impl FieldValue for PostgresValue {
    fn to_value(&self) -> PostgresValue {
        self.clone()
    }

    fn from_value(value: PostgresValue) -> Result<Self, CoercionError> {
        Ok(value)
    }
}

impl FieldValue for String {
    fn to_value(&self) -> PostgresValue {
        PostgresValue::Text(self.clone())
    }

    fn from_value(value: PostgresValue) -> Result<Self, CoercionError> {
        match value {
            PostgresValue::Text(s) | PostgresValue::Decimal(s) => Ok(s),
            PostgresValue::Json(serde_json::Value::String(s)) => Ok(s),
            other => Err(CoercionError::mismatch("string", &other)),
        }
    }
}

macro_rules! integral_field_value {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl FieldValue for $ty {
            fn to_value(&self) -> PostgresValue {
                PostgresValue::$variant(*self)
            }

            fn from_value(value: PostgresValue) -> Result<Self, CoercionError> {
                let wide = value
                    .as_i64()
                    .ok_or_else(|| CoercionError::mismatch($name, &value))?;
                <$ty>::try_from(wide).map_err(|_| CoercionError::InvalidNumber(wide.to_string()))
            }
        }
    };
}

integral_field_value!(i16, SmallInt, "smallint");
integral_field_value!(i32, Integer, "integer");
integral_field_value!(i64, BigInt, "bigint");

impl FieldValue for f64 {
    fn to_value(&self) -> PostgresValue {
        PostgresValue::Float(*self)
    }

    fn from_value(value: PostgresValue) -> Result<Self, CoercionError> {
        match value {
            PostgresValue::Float(f) => Ok(f),
            PostgresValue::Decimal(ref s) => s
                .parse()
                .map_err(|_| CoercionError::InvalidNumber(s.clone())),
            other => other
                .as_i64()
                .map(|i| i as f64)
                .ok_or_else(|| CoercionError::mismatch("float", &other)),
        }
    }
}

impl FieldValue for bool {
    fn to_value(&self) -> PostgresValue {
        PostgresValue::Boolean(*self)
    }

    fn from_value(value: PostgresValue) -> Result<Self, CoercionError> {
        match value {
            PostgresValue::Boolean(b) => Ok(b),
            other => Err(CoercionError::mismatch("boolean", &other)),
        }
    }
}

impl FieldValue for Uuid {
    fn to_value(&self) -> PostgresValue {
        PostgresValue::Uuid(*self)
    }

    fn from_value(value: PostgresValue) -> Result<Self, CoercionError> {
        match value {
            PostgresValue::Uuid(id) => Ok(id),
            PostgresValue::Text(ref s) => {
                Uuid::parse_str(s).map_err(|_| CoercionError::mismatch("uuid", &value))
            }
            other => Err(CoercionError::mismatch("uuid", &other)),
        }
    }
}

impl FieldValue for DateTime<Utc> {
    fn to_value(&self) -> PostgresValue {
        PostgresValue::Timestamp(*self)
    }

    fn from_value(value: PostgresValue) -> Result<Self, CoercionError> {
        match value {
            PostgresValue::Timestamp(ts) => Ok(ts),
            other => Err(CoercionError::mismatch("datetime", &other)),
        }
    }
}

impl FieldValue for NaiveDate {
    fn to_value(&self) -> PostgresValue {
        PostgresValue::Date(*self)
    }

    fn from_value(value: PostgresValue) -> Result<Self, CoercionError> {
        match value {
            PostgresValue::Date(date) => Ok(date),
            other => Err(CoercionError::mismatch("date", &other)),
        }
    }
}

impl FieldValue for NaiveTime {
    fn to_value(&self) -> PostgresValue {
        PostgresValue::Time(*self)
    }

    fn from_value(value: PostgresValue) -> Result<Self, CoercionError> {
        match value {
            PostgresValue::Time(time) => Ok(time),
            other => Err(CoercionError::mismatch("time", &other)),
        }
    }
}

impl FieldValue for serde_json::Value {
    fn to_value(&self) -> PostgresValue {
        PostgresValue::Json(self.clone())
    }

    fn from_value(value: PostgresValue) -> Result<Self, CoercionError> {
        match value {
            PostgresValue::Json(json) => Ok(json),
            PostgresValue::Null => Ok(serde_json::Value::Null),
            other => Ok(other.to_json()),
        }
    }
}

impl FieldValue for Vec<u8> {
    fn to_value(&self) -> PostgresValue {
        PostgresValue::Bytes(self.clone())
    }

    fn from_value(value: PostgresValue) -> Result<Self, CoercionError> {
        match value {
            PostgresValue::Bytes(bytes) => Ok(bytes),
            other => Err(CoercionError::mismatch("binary", &other)),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn to_value(&self) -> PostgresValue {
        match self {
            Some(inner) => inner.to_value(),
            None => PostgresValue::Null,
        }
    }

    fn from_value(value: PostgresValue) -> Result<Self, CoercionError> {
        match value {
            PostgresValue::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
