//! SQL type conversion utilities
//!
//! This module handles conversion between PostgreSQL type names
//! and declared field types.

use crate::field_type::FieldType;

/// Map a PostgreSQL type name (catalog or driver spelling) to a field type
pub fn pg_type_to_field_type(pg_type: &str) -> Option<FieldType> {
    let normalized = pg_type.trim().to_ascii_lowercase();
    let base = normalized
        .split('(')
        .next()
        .unwrap_or(normalized.as_str())
        .trim();

    match base {
        "text" | "varchar" | "character varying" | "char" | "character" | "bpchar" | "name"
        | "uuid" | "citext" => Some(FieldType::String),
        "bool" | "boolean" => Some(FieldType::Boolean),
        "float4" | "float8" | "real" | "double precision" | "numeric" | "decimal" => {
            Some(FieldType::Float)
        }
        "int2" | "int4" | "int8" | "smallint" | "integer" | "bigint" | "serial" | "bigserial" => {
            Some(FieldType::Integer)
        }
        "date" => Some(FieldType::Date),
        "time" | "time without time zone" | "timetz" | "time with time zone" => {
            Some(FieldType::Time)
        }
        "timestamp" | "timestamptz" | "timestamp without time zone"
        | "timestamp with time zone" => Some(FieldType::Datetime),
        "json" | "jsonb" => Some(FieldType::JsonObject),
        "bytea" => Some(FieldType::Binary),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_spellings() {
        assert_eq!(pg_type_to_field_type("character varying(255)"), Some(FieldType::String));
        assert_eq!(pg_type_to_field_type("INT4"), Some(FieldType::Integer));
        assert_eq!(
            pg_type_to_field_type("timestamp with time zone"),
            Some(FieldType::Datetime)
        );
        assert_eq!(pg_type_to_field_type("tsvector"), None);
    }
}
