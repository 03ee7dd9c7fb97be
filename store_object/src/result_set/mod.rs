//! Hydrating result sets
//!
//! Rows are hydrated lazily as the caller iterates. Buffered sets know their
//! length; unbuffered sets refuse to count; paginated sets fetch one page of
//! rows at a time.

pub mod hydrating;
pub mod paginated;
pub mod unbuffered;

use std::sync::Arc;

use signal_system::{CastPipeline, SignalManager};

use crate::errors::Result;
use crate::executor::Row;
use crate::hydrator::Hydrator;
use crate::metadata::ModelMetadata;
use crate::model::Model;

pub use hydrating::HydratingResultSet;
pub use paginated::PaginatedResultSet;
pub use unbuffered::UnbufferedHydratingResultSet;

/// What a result set needs to hydrate rows after the query has returned
#[derive(Debug, Clone)]
pub struct HydrationContext {
    pub metadata: Arc<ModelMetadata>,
    pub signals: Arc<SignalManager>,
    pub casts: Arc<CastPipeline>,
}

impl HydrationContext {
    pub fn hydrate<T: Model>(&self, row: Row) -> Result<T> {
        Hydrator::new(&self.signals, &self.casts).hydrate_new(row, &self.metadata)
    }
}

/// A resolved relationship
pub enum Related<'m, T: Model> {
    /// toOne: the related object, if any
    One(Option<T>),
    Many(HydratingResultSet<T>),
    Unbuffered(UnbufferedHydratingResultSet<T>),
    Paged(PaginatedResultSet<'m, T>),
}

impl<'m, T: Model> Related<'m, T> {
    pub fn into_one(self) -> Option<T> {
        match self {
            Related::One(object) => object,
            _ => None,
        }
    }

    pub fn into_many(self) -> Option<HydratingResultSet<T>> {
        match self {
            Related::Many(results) => Some(results),
            _ => None,
        }
    }

    pub fn into_unbuffered(self) -> Option<UnbufferedHydratingResultSet<T>> {
        match self {
            Related::Unbuffered(results) => Some(results),
            _ => None,
        }
    }

    pub fn into_paged(self) -> Option<PaginatedResultSet<'m, T>> {
        match self {
            Related::Paged(results) => Some(results),
            _ => None,
        }
    }
}

impl<T: Model> std::fmt::Debug for Related<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Related::One(object) => {
                if object.is_some() {
                    "One(Some)"
                } else {
                    "One(None)"
                }
            }
            Related::Many(_) => "Many",
            Related::Unbuffered(_) => "Unbuffered",
            Related::Paged(_) => "Paged",
        };
        write!(f, "Related::{}<{}>", kind, T::MODEL_NAME)
    }
}
