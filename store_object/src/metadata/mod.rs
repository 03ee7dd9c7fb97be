//! Model metadata
//!
//! Annotation records, their validated forms, and the per-class metadata
//! cache.

pub mod annotation;
pub mod model;
pub mod registry;
pub mod relationship;

pub use annotation::{Annotation, FieldAnnotation};
pub use model::ModelMetadata;
pub use registry::MetadataRegistry;
pub use relationship::{JoinTableSpec, RelationshipKind, RelationshipSpec};
