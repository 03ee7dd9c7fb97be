use std::marker::PhantomData;

use crate::errors::Result;
use crate::executor::{BufferedRows, RowIterator};
use crate::model::Model;
use crate::result_set::HydrationContext;

/// Buffered rows, hydrated into `T` on iteration
pub struct HydratingResultSet<T> {
    rows: BufferedRows,
    context: HydrationContext,
    _model: PhantomData<fn() -> T>,
}

impl<T: Model> HydratingResultSet<T> {
    pub fn new(rows: BufferedRows, context: HydrationContext) -> Self {
        Self {
            rows,
            context,
            _model: PhantomData,
        }
    }

    /// Total number of rows, regardless of iteration position
    pub fn len(&self) -> usize {
        self.rows.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hydrate the row at `index` without moving the cursor
    pub fn get(&self, index: usize) -> Option<Result<T>> {
        self.rows
            .get(index)
            .cloned()
            .map(|row| self.context.hydrate(row))
    }

    pub fn rewind(&mut self) {
        self.rows.rewind();
    }

    /// Hydrate every remaining row, stopping at the first failure
    pub fn try_collect(self) -> Result<Vec<T>> {
        self.collect()
    }
}

impl<T: Model> Iterator for HydratingResultSet<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next_row().map(|row| self.context.hydrate(row))
    }
}

impl<T> std::fmt::Debug for HydratingResultSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HydratingResultSet")
            .field("model", &self.context.metadata.model)
            .field("rows", &self.rows.rows().len())
            .finish()
    }
}
