//! Query predicates
//!
//! Condition trees over column references and runtime values.

use type_mapping::PostgresValue;

use crate::validation::{validate_column_reference, ValidationError};

/// Query condition operators
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperator {
    Eq,        // =
    Ne,        // !=
    Gt,        // >
    Gte,       // >=
    Lt,        // <
    Lte,       // <=
    Like,      // LIKE
    ILike,     // ILIKE (case insensitive)
    In,        // IN
    NotIn,     // NOT IN
    IsNull,    // IS NULL
    IsNotNull, // IS NOT NULL
}

/// Single condition in WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCondition {
    pub field: String,
    pub operator: QueryOperator,
    pub value: Option<PostgresValue>, // None for IS NULL/IS NOT NULL
}

/// Logical operators for combining conditions
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// Query filter that can be nested
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    Condition(QueryCondition),
    Group {
        operator: LogicalOperator,
        filters: Vec<QueryFilter>,
    },
}

impl QueryFilter {
    /// Create a simple condition
    pub fn condition(field: &str, operator: QueryOperator, value: Option<PostgresValue>) -> Self {
        Self::Condition(QueryCondition {
            field: field.to_string(),
            operator,
            value,
        })
    }

    /// Create AND group
    pub fn and(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::And,
            filters,
        }
    }

    /// Create OR group
    pub fn or(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::Or,
            filters,
        }
    }

    /// Equal condition
    pub fn eq(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::condition(field, QueryOperator::Eq, Some(value.into()))
    }

    /// Not equal condition
    pub fn ne(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::condition(field, QueryOperator::Ne, Some(value.into()))
    }

    /// Greater than condition
    pub fn gt(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::condition(field, QueryOperator::Gt, Some(value.into()))
    }

    /// Greater than or equal condition
    pub fn gte(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::condition(field, QueryOperator::Gte, Some(value.into()))
    }

    /// Less than condition
    pub fn lt(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::condition(field, QueryOperator::Lt, Some(value.into()))
    }

    /// Less than or equal condition
    pub fn lte(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::condition(field, QueryOperator::Lte, Some(value.into()))
    }

    /// LIKE condition
    pub fn like(field: &str, pattern: &str) -> Self {
        Self::condition(field, QueryOperator::Like, Some(PostgresValue::from(pattern)))
    }

    /// ILIKE condition (case insensitive)
    pub fn ilike(field: &str, pattern: &str) -> Self {
        Self::condition(field, QueryOperator::ILike, Some(PostgresValue::from(pattern)))
    }

    /// IN condition
    pub fn in_values(field: &str, values: Vec<PostgresValue>) -> Self {
        Self::condition(field, QueryOperator::In, Some(PostgresValue::Array(values)))
    }

    /// NOT IN condition
    pub fn not_in_values(field: &str, values: Vec<PostgresValue>) -> Self {
        Self::condition(field, QueryOperator::NotIn, Some(PostgresValue::Array(values)))
    }

    /// IS NULL condition
    pub fn is_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNull, None)
    }

    /// IS NOT NULL condition
    pub fn is_not_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNotNull, None)
    }

    /// AND-combine with another filter, flattening an existing AND group
    pub fn and_also(self, other: QueryFilter) -> Self {
        match self {
            QueryFilter::Group {
                operator: LogicalOperator::And,
                mut filters,
            } => {
                filters.push(other);
                Self::and(filters)
            }
            existing => Self::and(vec![existing, other]),
        }
    }

    /// Every column reference must be a valid (optionally qualified) identifier
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            QueryFilter::Condition(condition) => validate_column_reference(&condition.field),
            QueryFilter::Group { filters, .. } => filters.iter().try_for_each(QueryFilter::validate),
        }
    }

    /// Rewrite every column reference
    pub fn map_fields<F>(&self, rewrite: &F) -> Self
    where
        F: Fn(&str) -> String,
    {
        match self {
            QueryFilter::Condition(condition) => Self::Condition(QueryCondition {
                field: rewrite(&condition.field),
                operator: condition.operator.clone(),
                value: condition.value.clone(),
            }),
            QueryFilter::Group { operator, filters } => Self::Group {
                operator: operator.clone(),
                filters: filters.iter().map(|f| f.map_fields(rewrite)).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_also_flattens_and_groups() {
        let filter = QueryFilter::eq("forename", "John")
            .and_also(QueryFilter::eq("surname", "Smith"))
            .and_also(QueryFilter::is_not_null("email"));

        match filter {
            QueryFilter::Group {
                operator: LogicalOperator::And,
                filters,
            } => assert_eq!(filters.len(), 3),
            other => panic!("expected AND group, got {:?}", other),
        }
    }

    #[test]
    fn test_and_also_wraps_or_groups() {
        let either = QueryFilter::or(vec![
            QueryFilter::eq("status", "active"),
            QueryFilter::eq("status", "pending"),
        ]);
        let filter = either.clone().and_also(QueryFilter::gt("id", 10i64));

        assert_eq!(
            filter,
            QueryFilter::and(vec![either, QueryFilter::gt("id", 10i64)])
        );
    }

    #[test]
    fn test_validate_rejects_injected_field_names() {
        assert!(QueryFilter::eq("t0.forename", "John").validate().is_ok());
        assert!(QueryFilter::and(vec![
            QueryFilter::eq("forename", "John"),
            QueryFilter::eq("1=1; --", "x"),
        ])
        .validate()
        .is_err());
    }

    #[test]
    fn test_map_fields_rewrites_nested_references() {
        let filter = QueryFilter::or(vec![
            QueryFilter::eq("forename", "John"),
            QueryFilter::is_null("surname"),
        ]);
        let mapped = filter.map_fields(&|field: &str| format!("t0.{}", field));

        assert_eq!(
            mapped,
            QueryFilter::or(vec![
                QueryFilter::eq("t0.forename", "John"),
                QueryFilter::is_null("t0.surname"),
            ])
        );
    }
}
