//! Statement execution collaborator
//!
//! The mapping layer hands rendered statements to an [`Executor`] and reads
//! results back through a forward-only [`RowIterator`].

pub mod postgres;

use async_trait::async_trait;
use type_mapping::PostgresValue;

use crate::errors::Result;

pub use postgres::PgExecutor;

/// Rendered SQL with positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<PostgresValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<PostgresValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// One result row, columns in result order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, PostgresValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(columns: Vec<(String, PostgresValue)>) -> Self {
        Self { columns }
    }

    pub fn with(mut self, name: &str, value: impl Into<PostgresValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: &str, value: impl Into<PostgresValue>) {
        self.columns.push((name.to_string(), value.into()));
    }

    /// First column named `name`
    pub fn get(&self, name: &str) -> Option<&PostgresValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PostgresValue)> {
        self.columns
            .iter()
            .map(|(column, value)| (column.as_str(), value))
    }

    pub fn into_pairs(self) -> Vec<(String, PostgresValue)> {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Forward-only access to a statement's result rows
pub trait RowIterator: Send {
    /// Advance and return the next row
    fn next_row(&mut self) -> Option<Row>;

    /// The row most recently returned by `next_row`
    fn current(&self) -> Option<&Row>;

    /// Number of rows, when the source knows it
    fn len(&self) -> Option<usize> {
        None
    }

    /// Materialize the remaining rows in memory
    fn buffer(mut self: Box<Self>) -> BufferedRows {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row() {
            rows.push(row);
        }
        BufferedRows::new(rows)
    }
}

/// In-memory rows with random access and a known length
#[derive(Debug, Clone, Default)]
pub struct BufferedRows {
    rows: Vec<Row>,
    cursor: usize,
}

impl BufferedRows {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows, cursor: 0 }
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

impl RowIterator for BufferedRows {
    fn next_row(&mut self) -> Option<Row> {
        let row = self.rows.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(row)
    }

    fn current(&self) -> Option<&Row> {
        self.cursor.checked_sub(1).and_then(|index| self.rows.get(index))
    }

    fn len(&self) -> Option<usize> {
        Some(self.rows.len())
    }

    fn buffer(self: Box<Self>) -> BufferedRows {
        *self
    }
}

/// Runs statements against storage
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, statement: &Statement) -> Result<Box<dyn RowIterator>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Iterator that hides its length, like a streaming driver cursor
    struct Streaming(std::vec::IntoIter<Row>, Option<Row>);

    impl RowIterator for Streaming {
        fn next_row(&mut self) -> Option<Row> {
            self.1 = self.0.next();
            self.1.clone()
        }

        fn current(&self) -> Option<&Row> {
            self.1.as_ref()
        }
    }

    fn rows(count: i64) -> Vec<Row> {
        (1..=count).map(|id| Row::new().with("id", id)).collect()
    }

    #[test]
    fn test_buffered_rows_iterate_and_count() {
        let mut buffered = BufferedRows::new(rows(2));
        assert_eq!(RowIterator::len(&buffered), Some(2));
        assert!(buffered.current().is_none());

        let first = buffered.next_row().unwrap();
        assert_eq!(first.get("id"), Some(&PostgresValue::BigInt(1)));
        assert_eq!(buffered.current(), Some(&first));

        buffered.next_row().unwrap();
        assert!(buffered.next_row().is_none());

        buffered.rewind();
        assert_eq!(buffered.next_row(), Some(first));
    }

    #[test]
    fn test_buffering_a_stream_materializes_remaining_rows() {
        let stream: Box<dyn RowIterator> = Box::new(Streaming(rows(3).into_iter(), None));
        assert_eq!(stream.len(), None);

        let buffered = stream.buffer();
        assert_eq!(RowIterator::len(&buffered), Some(3));
        assert_eq!(buffered.get(2).and_then(|row| row.get("id")), Some(&PostgresValue::BigInt(3)));
    }

    #[test]
    fn test_row_lookup_returns_first_match() {
        let row = Row::new().with("id", 1i64).with("id", 2i64);
        assert_eq!(row.get("id"), Some(&PostgresValue::BigInt(1)));
        assert_eq!(row.len(), 2);
    }
}
