//! Result ordering

use crate::validation::{validate_column_reference, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// One ORDER BY entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub order: SortOrder,
}

impl OrderBy {
    pub fn new(field: &str, order: SortOrder) -> Result<Self, ValidationError> {
        validate_column_reference(field)?;
        Ok(Self {
            field: field.to_string(),
            order,
        })
    }

    pub fn asc(field: &str) -> Result<Self, ValidationError> {
        Self::new(field, SortOrder::Asc)
    }

    pub fn desc(field: &str) -> Result<Self, ValidationError> {
        Self::new(field, SortOrder::Desc)
    }

    /// Parse `column`, `column ASC` or `column DESC` (direction is case-insensitive)
    pub fn parse(expression: &str) -> Result<Self, ValidationError> {
        let mut parts = expression.split_whitespace();
        let field = parts.next().ok_or(ValidationError::Empty)?;
        let order = match parts.next() {
            None => SortOrder::Asc,
            Some(direction) if direction.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            Some(direction) if direction.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            Some(_) => return Err(ValidationError::InvalidCharacters(expression.to_string())),
        };
        if parts.next().is_some() {
            return Err(ValidationError::InvalidCharacters(expression.to_string()));
        }
        Self::new(field, order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort_expressions() {
        assert_eq!(OrderBy::parse("sort").unwrap(), OrderBy::asc("sort").unwrap());
        assert_eq!(
            OrderBy::parse("  created_at   desc ").unwrap(),
            OrderBy::desc("created_at").unwrap()
        );
        assert_eq!(
            OrderBy::parse("t1.surname ASC").unwrap(),
            OrderBy::asc("t1.surname").unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(OrderBy::parse("").is_err());
        assert!(OrderBy::parse("sort sideways").is_err());
        assert!(OrderBy::parse("sort ASC, id").is_err());
        assert!(OrderBy::parse("sort; DROP TABLE x").is_err());
    }
}
