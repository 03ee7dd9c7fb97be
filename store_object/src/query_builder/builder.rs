//! Query construction
//!
//! Turns a [`Criteria`] plus a model's relational metadata into a
//! [`QuerySpec`]: the root table aliased `t0`, one LEFT JOIN per dependent
//! table of the hierarchy, and one LEFT JOIN per link-table join.

use crate::errors::{ModelError, Result};
use crate::query_builder::criteria::Criteria;
use crate::query_builder::join::{JoinClause, JoinType};
use crate::query_builder::ordering::OrderBy;
use crate::query_builder::spec::{table_alias, QuerySpec};
use crate::schema::RelationalMetadata;

/// Query builder over one model's relational metadata
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'m> {
    metadata: &'m RelationalMetadata,
}

impl<'m> QueryBuilder<'m> {
    pub fn new(metadata: &'m RelationalMetadata) -> Self {
        Self { metadata }
    }

    /// Build the SELECT for `criteria`
    ///
    /// Link-table joins are folded into the criteria's predicate and ordering
    /// the first time they are seen.
    pub fn build_query(&self, criteria: &mut Criteria) -> Result<QuerySpec> {
        criteria.fold_joins()?;

        let root = self.metadata.root();
        let aliases = self.aliases();
        let mut spec = QuerySpec::new(root);
        spec.columns = self.metadata.column_map.columns_of(root);

        for (index, table) in aliases.iter().enumerate().skip(1) {
            spec.joins.push(self.hierarchy_join(table, index, &aliases)?);
        }

        let root_alias = table_alias(0);
        for join in criteria.joins() {
            spec.joins.push(
                JoinClause::new(JoinType::Left, join.referenced_by.clone()).on(
                    format!("{}.{}", join.referenced_by, join.foreign_by),
                    format!("{}.{}", root_alias, join.foreign_key),
                ),
            );
        }

        let qualify = |field: &str| self.qualify(field, &aliases);
        spec.predicate = criteria.where_clause().map(|filter| filter.map_fields(&qualify));
        spec.order_by = criteria
            .order_by()
            .iter()
            .map(|order| OrderBy {
                field: qualify(&order.field),
                order: order.order,
            })
            .collect();

        spec.limit = criteria.limit();
        spec.offset = criteria.limit().and(criteria.offset());

        debug_log!(
            "[QUERY] Built query for {}: {} joins, limit {:?}",
            criteria.model(),
            spec.joins.len(),
            spec.limit
        );

        Ok(spec)
    }

    /// Build a query counting every row `criteria` matches, ignoring its
    /// paging window and ordering
    pub fn build_count_query(&self, criteria: &mut Criteria) -> Result<QuerySpec> {
        Ok(self.build_query(criteria)?.into_count())
    }

    /// Hierarchy tables in alias order: root first, then pre-order
    fn aliases(&self) -> Vec<String> {
        self.metadata.hierarchy.walk()
    }

    fn alias_of(table: &str, aliases: &[String]) -> Option<String> {
        aliases
            .iter()
            .position(|candidate| candidate == table)
            .map(table_alias)
    }

    fn hierarchy_join(&self, table: &str, index: usize, aliases: &[String]) -> Result<JoinClause> {
        let foreign_key = self
            .metadata
            .foreign_key(table)
            .ok_or_else(|| ModelError::MissingForeignKeyMetadata(table.to_string()))?;
        let parent_alias = Self::alias_of(&foreign_key.table_to, aliases)
            .ok_or_else(|| ModelError::MissingForeignKeyMetadata(table.to_string()))?;
        let alias = table_alias(index);

        let mut join = JoinClause::new(JoinType::Left, table)
            .with_alias(alias.clone())
            .with_columns(self.metadata.column_map.columns_of(table));
        for (local, referenced) in foreign_key.column_reference_map()? {
            join = join.on(
                format!("{}.{}", alias, local),
                format!("{}.{}", parent_alias, referenced),
            );
        }

        Ok(join)
    }

    /// Prefix a bare column with the alias of the table that owns it
    fn qualify(&self, field: &str, aliases: &[String]) -> String {
        if field.contains('.') {
            return field.to_string();
        }

        self.metadata
            .column_map
            .table_of(field)
            .and_then(|table| Self::alias_of(table, aliases))
            .map(|alias| format!("{}.{}", alias, field))
            .unwrap_or_else(|| field.to_string())
    }
}
