use thiserror::Error;

/// Failures raised while coercing raw values into declared field types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("Invalid datetime value: {0}")]
    InvalidDatetime(String),

    #[error("Invalid date value: {0}")]
    InvalidDate(String),

    #[error("Invalid time value: {0}")]
    InvalidTime(String),

    #[error("Invalid JSON value: {0}")]
    InvalidJson(String),

    #[error("Invalid numeric value: {0}")]
    InvalidNumber(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: &'static str, actual: String },

    #[error("Unknown field type: {0}")]
    UnknownFieldType(String),
}

impl CoercionError {
    pub fn mismatch(expected: &'static str, actual: &crate::PostgresValue) -> Self {
        CoercionError::TypeMismatch {
            expected,
            actual: format!("{:?}", actual),
        }
    }
}
