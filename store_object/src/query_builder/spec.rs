use crate::query_builder::filter::QueryFilter;
use crate::query_builder::join::JoinClause;
use crate::query_builder::ordering::OrderBy;

/// Alias of the table at hierarchy position `index`
pub fn table_alias(index: usize) -> String {
    format!("t{}", index)
}

/// Storage-independent description of one SELECT
///
/// Column references in `predicate` and `order_by` are qualified with the
/// owning table's alias wherever the column map knows the column.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub from: String,
    pub alias: String,
    pub columns: Vec<String>,
    pub joins: Vec<JoinClause>,
    pub predicate: Option<QueryFilter>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Select `COUNT(*) AS count` instead of columns
    pub count: bool,
}

impl QuerySpec {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            alias: table_alias(0),
            columns: Vec::new(),
            joins: Vec::new(),
            predicate: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            count: false,
        }
    }

    /// Turn this into a count of the whole matching set
    pub fn into_count(mut self) -> Self {
        self.count = true;
        self.columns.clear();
        for join in &mut self.joins {
            join.columns.clear();
        }
        self.order_by.clear();
        self.limit = None;
        self.offset = None;
        self
    }
}
