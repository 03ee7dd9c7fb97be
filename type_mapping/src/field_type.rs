//! Declared field type tags
//!
//! The closed set of type tags a `Field` annotation may carry.

use crate::errors::CoercionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Boolean,
    Float,
    Date,
    Time,
    Datetime,
    JsonArray,
    JsonObject,
    Integer,
    Binary,
}

impl FieldType {
    pub const ALL: [FieldType; 10] = [
        FieldType::String,
        FieldType::Boolean,
        FieldType::Float,
        FieldType::Date,
        FieldType::Time,
        FieldType::Datetime,
        FieldType::JsonArray,
        FieldType::JsonObject,
        FieldType::Integer,
        FieldType::Binary,
    ];

    /// The tag exactly as it appears in annotations
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Float => "float",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::Datetime => "datetime",
            FieldType::JsonArray => "json_array",
            FieldType::JsonObject => "json_object",
            FieldType::Integer => "integer",
            FieldType::Binary => "binary",
        }
    }
}

impl FromStr for FieldType {
    type Err = CoercionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|field_type| field_type.as_str() == s)
            .ok_or_else(|| CoercionError::UnknownFieldType(s.to_string()))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
