//! Store Object - Core object-relational mapping layer for ModelHaus
//!
//! This crate derives model metadata from annotations and the live schema,
//! builds SELECT statements across multi-table hierarchies, hydrates rows
//! into typed objects, and writes changed objects back table by table.

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod errors;
pub mod executor;
pub mod hydrator;
pub mod manager;
pub mod metadata;
pub mod model;
pub mod persistence;
pub mod prelude;
pub mod query_builder;
pub mod result_set;
pub mod schema;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tracking;
pub mod validation;

pub use errors::{ModelError, Result};
pub use executor::{BufferedRows, Executor, PgExecutor, Row, RowIterator, Statement};
pub use hydrator::Hydrator;
pub use manager::ModelManager;
pub use metadata::{Annotation, MetadataRegistry, ModelMetadata, RelationshipKind, RelationshipSpec};
pub use model::{Entity, FieldAccessor, FieldAccessors, Model, UnmappedProperties};
pub use persistence::{PendingWrites, PersistenceCoordinator, SharedEntity, WriteMode};
pub use query_builder::{
    Criteria, ExtraJoin, OrderBy, QueryBuilder, QueryFilter, QueryOperator, QuerySpec, SortOrder,
    SqlGenerator,
};
pub use result_set::{
    HydratingResultSet, HydrationContext, PaginatedResultSet, Related, UnbufferedHydratingResultSet,
};
pub use schema::{PgSchemaCatalog, RelationalMetadata, RelationalSchemaAdapter, SchemaCatalog};
pub use tracking::ChangeTracker;
pub use type_mapping::{FieldType, FieldValue, PostgresValue};
pub use validation::ValidationError;

use sqlx::PgPool;

pub type DbPool = PgPool;
