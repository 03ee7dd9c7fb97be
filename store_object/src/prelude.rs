//! Convenience re-exports for common store-object usage

// Model traits and declarations
pub use crate::metadata::Annotation;
pub use crate::model::{Entity, FieldAccessors, Model, UnmappedProperties};
pub use crate::tracking::ChangeTracker;

// Error types
pub use crate::errors::ModelError;

// Querying
pub use crate::query_builder::{Criteria, ExtraJoin, QueryFilter, SortOrder};
pub use crate::result_set::{HydratingResultSet, PaginatedResultSet, Related};

// Manager and collaborators
pub use crate::executor::{Executor, PgExecutor};
pub use crate::manager::ModelManager;
pub use crate::schema::{PgSchemaCatalog, SchemaCatalog};

// Values
pub use type_mapping::{FieldType, FieldValue, PostgresValue};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use sqlx::PgPool;
