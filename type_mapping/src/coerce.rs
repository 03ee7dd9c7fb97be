//! Field type coercion
//!
//! This module turns raw driver values into the representation declared by a
//! field's type tag.

use crate::errors::CoercionError;
use crate::field_type::FieldType;
use crate::types::PostgresValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Coerce a raw value into the representation declared by `field_type`
pub fn coerce(value: PostgresValue, field_type: FieldType) -> Result<PostgresValue, CoercionError> {
    match field_type {
        FieldType::Datetime => coerce_datetime(value),
        FieldType::JsonArray | FieldType::JsonObject => coerce_json(value),
        FieldType::Boolean => Ok(PostgresValue::Boolean(coerce_boolean(&value))),
        FieldType::Float => coerce_float(value),
        FieldType::Integer => coerce_integer(value),
        FieldType::String => coerce_string(value),
        FieldType::Date => coerce_date(value),
        FieldType::Time => coerce_time(value),
        FieldType::Binary => coerce_binary(value),
    }
}

fn coerce_datetime(value: PostgresValue) -> Result<PostgresValue, CoercionError> {
    match value {
        PostgresValue::Timestamp(_) | PostgresValue::Null => Ok(value),
        PostgresValue::Date(date) => midnight(date).map(PostgresValue::Timestamp),
        PostgresValue::Text(text) => parse_datetime(&text).map(PostgresValue::Timestamp),
        PostgresValue::Json(serde_json::Value::String(text)) => {
            parse_datetime(&text).map(PostgresValue::Timestamp)
        }
        other => Err(CoercionError::InvalidDatetime(other.to_string())),
    }
}

fn parse_datetime(text: &str) -> Result<DateTime<Utc>, CoercionError> {
    let text = text.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| CoercionError::InvalidDatetime(text.to_string()))
        .and_then(midnight)
}

fn midnight(date: NaiveDate) -> Result<DateTime<Utc>, CoercionError> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| CoercionError::InvalidDatetime(date.to_string()))
}

fn coerce_json(value: PostgresValue) -> Result<PostgresValue, CoercionError> {
    match value {
        PostgresValue::Json(_) | PostgresValue::Null => Ok(value),
        PostgresValue::Text(text) => serde_json::from_str(&text)
            .map(PostgresValue::Json)
            .map_err(|e| CoercionError::InvalidJson(e.to_string())),
        PostgresValue::Bytes(bytes) => serde_json::from_slice(&bytes)
            .map(PostgresValue::Json)
            .map_err(|e| CoercionError::InvalidJson(e.to_string())),
        compound @ (PostgresValue::Array(_) | PostgresValue::Record(_)) => {
            Ok(PostgresValue::Json(compound.to_json()))
        }
        other => Err(CoercionError::InvalidJson(other.to_string())),
    }
}

/// false for {false, 0, "false", null}; true otherwise
fn coerce_boolean(value: &PostgresValue) -> bool {
    match value {
        PostgresValue::Boolean(b) => *b,
        PostgresValue::Null => false,
        PostgresValue::SmallInt(_) | PostgresValue::Integer(_) | PostgresValue::BigInt(_) => {
            value.as_i64() != Some(0)
        }
        PostgresValue::Float(f) => *f != 0.0,
        PostgresValue::Text(text) => !matches!(text.as_str(), "false" | "0"),
        PostgresValue::Json(serde_json::Value::Bool(b)) => *b,
        PostgresValue::Json(serde_json::Value::Null) => false,
        _ => true,
    }
}

fn coerce_float(value: PostgresValue) -> Result<PostgresValue, CoercionError> {
    let float = match &value {
        PostgresValue::Null => return Ok(PostgresValue::Null),
        PostgresValue::Float(f) => *f,
        PostgresValue::SmallInt(_) | PostgresValue::Integer(_) | PostgresValue::BigInt(_) => {
            value.as_i64().unwrap_or_default() as f64
        }
        PostgresValue::Boolean(b) => f64::from(u8::from(*b)),
        PostgresValue::Text(text) | PostgresValue::Decimal(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| CoercionError::InvalidNumber(text.clone()))?,
        PostgresValue::Json(serde_json::Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| CoercionError::InvalidNumber(n.to_string()))?,
        other => return Err(CoercionError::mismatch("float", other)),
    };

    Ok(PostgresValue::Float(float))
}

fn coerce_integer(value: PostgresValue) -> Result<PostgresValue, CoercionError> {
    let integer = match &value {
        PostgresValue::Null => return Ok(PostgresValue::Null),
        PostgresValue::SmallInt(_) | PostgresValue::Integer(_) | PostgresValue::BigInt(_) => {
            value.as_i64().unwrap_or_default()
        }
        PostgresValue::Float(f) => f.trunc() as i64,
        PostgresValue::Boolean(b) => i64::from(*b),
        PostgresValue::Text(text) | PostgresValue::Decimal(text) => parse_integer(text)?,
        PostgresValue::Json(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| CoercionError::InvalidNumber(n.to_string()))?,
        other => return Err(CoercionError::mismatch("integer", other)),
    };

    Ok(PostgresValue::BigInt(integer))
}

fn parse_integer(text: &str) -> Result<i64, CoercionError> {
    let trimmed = text.trim();
    trimmed
        .parse::<i64>()
        .or_else(|_| trimmed.parse::<f64>().map(|f| f.trunc() as i64))
        .map_err(|_| CoercionError::InvalidNumber(text.to_string()))
}

fn coerce_string(value: PostgresValue) -> Result<PostgresValue, CoercionError> {
    match value {
        PostgresValue::Text(_) | PostgresValue::Null => Ok(value),
        PostgresValue::Json(serde_json::Value::String(text)) => Ok(PostgresValue::Text(text)),
        PostgresValue::Bytes(bytes) => String::from_utf8(bytes)
            .map(PostgresValue::Text)
            .map_err(|e| CoercionError::InvalidJson(e.to_string())),
        other => Ok(PostgresValue::Text(other.to_string())),
    }
}

fn coerce_date(value: PostgresValue) -> Result<PostgresValue, CoercionError> {
    match value {
        PostgresValue::Date(_) | PostgresValue::Null => Ok(value),
        PostgresValue::Timestamp(ts) => Ok(PostgresValue::Date(ts.date_naive())),
        PostgresValue::Text(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map(PostgresValue::Date)
            .or_else(|_| parse_datetime(&text).map(|ts| PostgresValue::Date(ts.date_naive())))
            .map_err(|_| CoercionError::InvalidDate(text)),
        other => Err(CoercionError::InvalidDate(other.to_string())),
    }
}

fn coerce_time(value: PostgresValue) -> Result<PostgresValue, CoercionError> {
    match value {
        PostgresValue::Time(_) | PostgresValue::Null => Ok(value),
        PostgresValue::Timestamp(ts) => Ok(PostgresValue::Time(ts.time())),
        PostgresValue::Text(text) => TIME_FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(text.trim(), format).ok())
            .map(PostgresValue::Time)
            .ok_or(CoercionError::InvalidTime(text)),
        other => Err(CoercionError::InvalidTime(other.to_string())),
    }
}

fn coerce_binary(value: PostgresValue) -> Result<PostgresValue, CoercionError> {
    match value {
        PostgresValue::Bytes(_) | PostgresValue::Null => Ok(value),
        PostgresValue::Text(text) => Ok(PostgresValue::Bytes(text.into_bytes())),
        other => Err(CoercionError::mismatch("binary", &other)),
    }
}
