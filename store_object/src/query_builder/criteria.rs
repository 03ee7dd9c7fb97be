//! Caller-supplied query constraints
//!
//! [`Criteria`] names the model being queried plus an optional predicate,
//! paging window, ordering and relationship joins. Setters validate eagerly
//! so a malformed criteria never reaches the query builder.

use type_mapping::PostgresValue;

use crate::errors::{ModelError, Result};
use crate::model::Model;
use crate::query_builder::filter::QueryFilter;
use crate::query_builder::ordering::OrderBy;
use crate::validation::{validate_column_reference, validate_identifier};

/// Join through a link table, as used by many-to-many relationships
///
/// Renders as `LEFT JOIN referenced_by ON referenced_by.foreign_by = t0.foreign_key`
/// and restricts results to `referenced_by.mapped_by = mapped_key`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraJoin {
    pub foreign_by: String,
    pub foreign_key: String,
    pub referenced_by: String,
    pub mapped_by: String,
    pub mapped_key: PostgresValue,
    pub referenced_order: Option<OrderBy>,
}

impl ExtraJoin {
    pub fn new(
        referenced_by: &str,
        foreign_by: &str,
        foreign_key: &str,
        mapped_by: &str,
        mapped_key: impl Into<PostgresValue>,
    ) -> Result<Self> {
        for identifier in [referenced_by, foreign_by, foreign_key, mapped_by] {
            validate_identifier(identifier)?;
        }

        Ok(Self {
            foreign_by: foreign_by.to_string(),
            foreign_key: foreign_key.to_string(),
            referenced_by: referenced_by.to_string(),
            mapped_by: mapped_by.to_string(),
            mapped_key: mapped_key.into(),
            referenced_order: None,
        })
    }

    /// Order by a column of the link table, e.g. `"sort DESC"`
    pub fn with_referenced_order(mut self, expression: &str) -> Result<Self> {
        self.referenced_order = Some(OrderBy::parse(expression)?);
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    model: String,
    where_clause: Option<QueryFilter>,
    limit: Option<u64>,
    offset: Option<u64>,
    order_by: Vec<OrderBy>,
    joins: Vec<ExtraJoin>,
    // Caller-supplied predicate and ordering, before join terms are folded in
    own_where: Option<QueryFilter>,
    own_order: Vec<OrderBy>,
}

impl Criteria {
    pub fn new(model: &str) -> Result<Self> {
        if model.trim().is_empty() {
            return Err(ModelError::InvalidCriteria(
                "model name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            model: model.to_string(),
            where_clause: None,
            limit: None,
            offset: None,
            order_by: Vec::new(),
            joins: Vec::new(),
            own_where: None,
            own_order: Vec::new(),
        })
    }

    pub fn for_model<T: Model>() -> Result<Self> {
        Self::new(T::MODEL_NAME)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn where_clause(&self) -> Option<&QueryFilter> {
        self.where_clause.as_ref()
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn order_by(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn joins(&self) -> &[ExtraJoin] {
        &self.joins
    }

    pub fn set_where(&mut self, filter: Option<QueryFilter>) -> Result<&mut Self> {
        if let Some(filter) = &filter {
            filter.validate()?;
        }
        self.own_where = filter.clone();
        self.where_clause = filter;
        Ok(self)
    }

    pub fn set_limit(&mut self, limit: Option<u64>) -> Result<&mut Self> {
        if limit == Some(0) {
            return Err(ModelError::InvalidCriteria(
                "limit must be a positive integer".to_string(),
            ));
        }
        self.limit = limit;
        Ok(self)
    }

    /// Offset is only rendered when a limit is also set
    pub fn set_offset(&mut self, offset: Option<u64>) -> &mut Self {
        self.offset = offset;
        self
    }

    pub fn set_order_by(&mut self, order_by: Vec<OrderBy>) -> &mut Self {
        self.own_order = order_by.clone();
        self.order_by = order_by;
        self
    }

    /// Append an ordering expression such as `"surname DESC"`
    pub fn add_order(&mut self, expression: &str) -> Result<&mut Self> {
        let order = OrderBy::parse(expression)?;
        self.own_order.push(order.clone());
        self.order_by.push(order);
        Ok(self)
    }

    pub fn set_joins(&mut self, joins: Vec<ExtraJoin>) -> &mut Self {
        self.joins = joins;
        self
    }

    pub fn add_join(&mut self, join: ExtraJoin) -> &mut Self {
        self.joins.push(join);
        self
    }

    pub fn with_where(mut self, filter: QueryFilter) -> Result<Self> {
        self.set_where(Some(filter))?;
        Ok(self)
    }

    pub fn with_limit(mut self, limit: u64) -> Result<Self> {
        self.set_limit(Some(limit))?;
        Ok(self)
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.set_offset(Some(offset));
        self
    }

    pub fn with_order(mut self, expression: &str) -> Result<Self> {
        self.add_order(expression)?;
        Ok(self)
    }

    pub fn with_join(mut self, join: ExtraJoin) -> Self {
        self.add_join(join);
        self
    }

    /// Recompute the predicate and ordering from the caller's own terms
    /// plus every join's restriction and link-table ordering
    ///
    /// The folded result is visible through [`Criteria::where_clause`] and
    /// [`Criteria::order_by`]; refolding never duplicates join terms.
    pub(crate) fn fold_joins(&mut self) -> Result<()> {
        let mut where_clause = self.own_where.clone();
        let mut order_by = self.own_order.clone();
        for join in &self.joins {
            let field = format!("{}.{}", join.referenced_by, join.mapped_by);
            validate_column_reference(&field)?;
            let restriction = QueryFilter::eq(&field, join.mapped_key.clone());
            where_clause = Some(match where_clause {
                Some(existing) => existing.and_also(restriction),
                None => restriction,
            });

            if let Some(order) = &join.referenced_order {
                let field = if order.field.contains('.') {
                    order.field.clone()
                } else {
                    format!("{}.{}", join.referenced_by, order.field)
                };
                order_by.push(OrderBy::new(&field, order.order)?);
            }
        }
        self.where_clause = where_clause;
        self.order_by = order_by;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role_join() -> ExtraJoin {
        ExtraJoin::new("moduledev_user_role", "role_id", "id", "user_id", 7i64)
            .unwrap()
            .with_referenced_order("sort")
            .unwrap()
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let mut criteria = Criteria::new("User").unwrap();
        assert!(matches!(
            criteria.set_limit(Some(0)),
            Err(ModelError::InvalidCriteria(_))
        ));
        assert_eq!(criteria.limit(), None);
        assert!(criteria.set_limit(Some(5)).is_ok());
        assert_eq!(criteria.limit(), Some(5));
    }

    #[test]
    fn test_empty_model_is_rejected() {
        assert!(Criteria::new("  ").is_err());
    }

    #[test]
    fn test_invalid_order_and_where_fail_fast() {
        assert!(Criteria::new("User").unwrap().with_order("name; --").is_err());
        assert!(Criteria::new("User")
            .unwrap()
            .with_where(QueryFilter::eq("bad name", "x"))
            .is_err());
        assert!(ExtraJoin::new("link table", "a", "b", "c", 1i64).is_err());
    }

    #[test]
    fn test_fold_joins_is_applied_once() {
        let mut criteria = Criteria::new("Role")
            .unwrap()
            .with_where(QueryFilter::eq("active", true))
            .unwrap()
            .with_join(role_join());

        criteria.fold_joins().unwrap();
        criteria.fold_joins().unwrap();

        assert_eq!(
            criteria.where_clause(),
            Some(&QueryFilter::and(vec![
                QueryFilter::eq("active", true),
                QueryFilter::eq("moduledev_user_role.user_id", 7i64),
            ]))
        );
        assert_eq!(
            criteria.order_by(),
            &[OrderBy::asc("moduledev_user_role.sort").unwrap()]
        );
    }

    #[test]
    fn test_replacing_the_predicate_keeps_join_restrictions() {
        let mut criteria = Criteria::new("Role").unwrap().with_join(role_join());
        criteria.fold_joins().unwrap();

        criteria
            .set_where(Some(QueryFilter::eq("name", "admin")))
            .unwrap();
        criteria.fold_joins().unwrap();

        assert_eq!(
            criteria.where_clause(),
            Some(&QueryFilter::and(vec![
                QueryFilter::eq("name", "admin"),
                QueryFilter::eq("moduledev_user_role.user_id", 7i64),
            ]))
        );
        assert_eq!(
            criteria.order_by(),
            &[OrderBy::asc("moduledev_user_role.sort").unwrap()]
        );
    }
}
