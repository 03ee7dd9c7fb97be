/// Represents the type of SQL JOIN operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// INNER JOIN - returns records that have matching values in both tables
    Inner,
    /// LEFT JOIN - returns all records from the left table and matched records from the right table
    Left,
}

impl JoinType {
    /// Convert JoinType to SQL string
    pub fn to_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
        }
    }
}

/// One `left = right` equality between qualified column references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCondition {
    pub left_field: String,
    pub right_field: String,
}

impl JoinCondition {
    pub fn new(left_field: impl Into<String>, right_field: impl Into<String>) -> Self {
        Self {
            left_field: left_field.into(),
            right_field: right_field.into(),
        }
    }
}

/// Represents a complete JOIN clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    /// Type of join (INNER, LEFT)
    pub join_type: JoinType,
    /// Table to join with
    pub table: String,
    /// Optional table alias
    pub alias: Option<String>,
    /// ON conditions, AND-combined
    pub conditions: Vec<JoinCondition>,
    /// Columns selected from the joined table
    pub columns: Vec<String>,
}

impl JoinClause {
    pub fn new(join_type: JoinType, table: impl Into<String>) -> Self {
        Self {
            join_type,
            table: table.into(),
            alias: None,
            conditions: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Add an alias for the joined table
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn on(mut self, left_field: impl Into<String>, right_field: impl Into<String>) -> Self {
        self.conditions.push(JoinCondition::new(left_field, right_field));
        self
    }

    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    /// Get the table reference (alias if present, otherwise table name)
    pub fn table_ref(&self) -> &str {
        self.alias.as_ref().unwrap_or(&self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_type_to_sql() {
        assert_eq!(JoinType::Inner.to_sql(), "INNER JOIN");
        assert_eq!(JoinType::Left.to_sql(), "LEFT JOIN");
    }

    #[test]
    fn test_join_clause_with_alias() {
        let join = JoinClause::new(JoinType::Left, "moduledev_user")
            .with_alias("t1")
            .on("t1.customer_id", "t0.id")
            .with_columns(vec!["forename".to_string()]);

        assert_eq!(join.table_ref(), "t1");
        assert_eq!(
            join.conditions,
            vec![JoinCondition::new("t1.customer_id", "t0.id")]
        );
        assert_eq!(join.columns, vec!["forename".to_string()]);
    }

    #[test]
    fn test_unaliased_join_refers_to_table() {
        let join = JoinClause::new(JoinType::Left, "moduledev_user_role");
        assert_eq!(join.table_ref(), "moduledev_user_role");
        assert!(join.conditions.is_empty());
    }
}
