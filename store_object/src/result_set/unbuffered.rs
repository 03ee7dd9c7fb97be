use std::marker::PhantomData;

use crate::errors::{ModelError, Result};
use crate::executor::RowIterator;
use crate::model::Model;
use crate::result_set::{HydratingResultSet, HydrationContext};

/// Forward-only rows straight from the executor
///
/// The row count is unknown until the rows are buffered.
pub struct UnbufferedHydratingResultSet<T> {
    rows: Box<dyn RowIterator>,
    context: HydrationContext,
    _model: PhantomData<fn() -> T>,
}

impl<T: Model> UnbufferedHydratingResultSet<T> {
    pub fn new(rows: Box<dyn RowIterator>, context: HydrationContext) -> Self {
        Self {
            rows,
            context,
            _model: PhantomData,
        }
    }

    /// Always fails with [`ModelError::UnsupportedCount`]; call
    /// [`buffer`](Self::buffer) first
    pub fn len(&self) -> Result<usize> {
        Err(ModelError::UnsupportedCount)
    }

    /// Materialize the remaining rows into a counted result set
    pub fn buffer(self) -> HydratingResultSet<T> {
        HydratingResultSet::new(self.rows.buffer(), self.context)
    }
}

impl<T: Model> Iterator for UnbufferedHydratingResultSet<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next_row().map(|row| self.context.hydrate(row))
    }
}

impl<T> std::fmt::Debug for UnbufferedHydratingResultSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnbufferedHydratingResultSet")
            .field("model", &self.context.metadata.model)
            .finish()
    }
}
