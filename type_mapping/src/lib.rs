//! Unified value and type mapping between Rust, PostgreSQL and model fields
//! This crate provides the runtime value, the field type tags and the coercion
//! rules shared across the modelhaus ecosystem

pub mod coerce;
pub mod convert;
pub mod errors;
pub mod field_type;
pub mod sql;
pub mod types;

// Re-export commonly used items
pub use coerce::coerce;
pub use convert::FieldValue;
pub use errors::CoercionError;
pub use field_type::FieldType;
pub use sql::pg_type_to_field_type;
pub use types::PostgresValue;
