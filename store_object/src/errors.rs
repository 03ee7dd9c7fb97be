use thiserror::Error;
use type_mapping::CoercionError;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    #[error("Schema lookup failed: {0}")]
    SchemaLookup(String),

    #[error("Missing foreign key metadata for table {0}")]
    MissingForeignKeyMetadata(String),

    #[error("Foreign key column mismatch on table {table}: {local} local columns, {referenced} referenced columns")]
    ForeignKeyColumnMismatch {
        table: String,
        local: usize,
        referenced: usize,
    },

    #[error("Cyclic foreign key hierarchy at table {0}")]
    CyclicHierarchy(String),

    #[error("No primary keys defined for table {0}")]
    NoPrimaryKeys(String),

    #[error("Coercion error: {0}")]
    Coercion(#[from] CoercionError),

    #[error("Unknown property {property} on model {model}")]
    UnknownProperty { model: String, property: String },

    #[error("Write aborted for model {model}: {reason}")]
    ValidationFailed { model: String, reason: String },

    #[error("Primary key of model {model} changed on table {table}; queue it with persist_rekey to move the row")]
    PrimaryKeyChanged { model: String, table: String },

    #[error("Count is not supported on unbuffered result sets")]
    UnsupportedCount,

    #[error("Hook error: {0}")]
    Hook(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ModelError {
    pub fn unknown_property(model: impl Into<String>, property: impl Into<String>) -> Self {
        ModelError::UnknownProperty {
            model: model.into(),
            property: property.into(),
        }
    }

    pub fn lock_poisoned(what: &str) -> Self {
        ModelError::Configuration(format!("{} lock poisoned", what))
    }
}

pub type Result<T, E = ModelError> = std::result::Result<T, E>;
