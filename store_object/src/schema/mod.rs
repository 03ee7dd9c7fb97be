//! Relational schema metadata
//!
//! Catalog collaborator, normalization into relational metadata, and the
//! PostgreSQL catalog implementation.

pub mod adapter;
pub mod catalog;
pub mod postgres;
pub mod relational;

pub use adapter::RelationalSchemaAdapter;
pub use catalog::{
    ColumnDescription, ConstraintDescription, ConstraintKind, SchemaCatalog, TableDescription,
};
pub use postgres::PgSchemaCatalog;
pub use relational::{ColumnMap, Constraints, ForeignKey, Hierarchy, RelationalMetadata};
