//! Relational schema adapter
//!
//! Turns raw catalog descriptions of a model's target tables into the
//! normalized column map, key constraints and table hierarchy.

use std::collections::HashSet;

use crate::errors::{ModelError, Result};
use crate::schema::catalog::{ConstraintKind, SchemaCatalog, TableDescription};
use crate::schema::relational::{ColumnMap, Constraints, ForeignKey, Hierarchy, RelationalMetadata};
use crate::validation::validate_identifier;

pub struct RelationalSchemaAdapter<'a> {
    catalog: &'a dyn SchemaCatalog,
}

impl<'a> RelationalSchemaAdapter<'a> {
    pub fn new(catalog: &'a dyn SchemaCatalog) -> Self {
        Self { catalog }
    }

    /// Describe every target table and normalize the result
    pub async fn fetch_metadata(&self, tables: &[String]) -> Result<RelationalMetadata> {
        if tables.is_empty() {
            return Err(ModelError::SchemaLookup(
                "At least one target table is required".to_string(),
            ));
        }

        let mut descriptions = Vec::with_capacity(tables.len());
        for table in tables {
            validate_identifier(table)?;
            debug_log!("[SCHEMA] Describing table: {}", table);

            match self.catalog.describe_table(table).await? {
                Some(description) => descriptions.push(description),
                None => {
                    return Err(ModelError::SchemaLookup(format!(
                        "Table {} does not exist",
                        table
                    )))
                }
            }
        }

        normalize(tables, &descriptions)
    }
}

/// Build relational metadata from descriptions given in target order
pub fn normalize(targets: &[String], descriptions: &[TableDescription]) -> Result<RelationalMetadata> {
    let root = targets.first().ok_or_else(|| {
        ModelError::SchemaLookup("At least one target table is required".to_string())
    })?;

    let mut column_map = ColumnMap::default();
    let mut constraints = Constraints::default();

    for description in descriptions {
        for column in &description.columns {
            column_map.insert_if_absent(&column.name, &description.name);
        }

        for constraint in &description.constraints {
            if constraint.kind != ConstraintKind::Primary {
                continue;
            }
            let primary = constraints
                .primary
                .entry(description.name.clone())
                .or_default();
            for column in &constraint.columns {
                if !primary.contains(column) {
                    primary.push(column.clone());
                }
            }
        }

        let mut foreign: Vec<_> = description
            .constraints
            .iter()
            .filter(|constraint| constraint.kind == ConstraintKind::Foreign)
            .filter_map(|constraint| {
                constraint
                    .referenced_table_name
                    .as_ref()
                    .filter(|table_to| targets.contains(*table_to))
                    .map(|table_to| (constraint, table_to))
            })
            .collect();
        foreign.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name));

        if let Some((constraint, table_to)) = foreign.first() {
            constraints.foreign.insert(
                description.name.clone(),
                ForeignKey {
                    table: description.name.clone(),
                    table_to: (*table_to).clone(),
                    columns: constraint.columns.clone(),
                    referenced_columns: constraint.referenced_columns.clone(),
                },
            );
        }
    }

    reject_cycles(targets, &constraints)?;
    let hierarchy = build_hierarchy(root, targets, &constraints)?;

    Ok(RelationalMetadata {
        column_map,
        constraints,
        hierarchy,
        targets: targets.to_vec(),
    })
}

fn reject_cycles(targets: &[String], constraints: &Constraints) -> Result<()> {
    for start in targets {
        let mut seen = HashSet::new();
        let mut current = start.as_str();
        while let Some(fk) = constraints.foreign.get(current) {
            if !seen.insert(current) {
                return Err(ModelError::CyclicHierarchy(current.to_string()));
            }
            current = fk.table_to.as_str();
        }
    }
    Ok(())
}

fn build_hierarchy(root: &str, targets: &[String], constraints: &Constraints) -> Result<Hierarchy> {
    let mut hierarchy = Hierarchy::new(root);
    let mut visited = HashSet::from([root.to_string()]);
    collect_children(root, targets, constraints, &mut hierarchy, &mut visited)?;

    if let Some(unreachable) = targets.iter().find(|table| !visited.contains(*table)) {
        return Err(ModelError::Configuration(format!(
            "Target table {} is not reachable from {} through foreign keys",
            unreachable, root
        )));
    }

    Ok(hierarchy)
}

fn collect_children(
    table: &str,
    targets: &[String],
    constraints: &Constraints,
    hierarchy: &mut Hierarchy,
    visited: &mut HashSet<String>,
) -> Result<()> {
    for candidate in targets {
        let points_here = constraints
            .foreign
            .get(candidate)
            .is_some_and(|fk| fk.table_to == table);
        if !points_here {
            continue;
        }
        if !visited.insert(candidate.clone()) {
            return Err(ModelError::CyclicHierarchy(candidate.clone()));
        }
        hierarchy.add_child(table, candidate);
        collect_children(candidate, targets, constraints, hierarchy, visited)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCatalog;

    fn targets(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn customer_schema() -> MemoryCatalog {
        MemoryCatalog::new()
            .with_table(
                TableDescription::new("customer")
                    .column("id", "int4")
                    .column("discount", "float8")
                    .primary_key(&["id"]),
            )
            .with_table(
                TableDescription::new("user")
                    .column("customer_id", "int4")
                    .column("id", "int4")
                    .column("forename", "text")
                    .primary_key(&["customer_id"])
                    .foreign_key(&["customer_id"], "customer", &["id"]),
            )
    }

    #[tokio::test]
    async fn test_customer_user_hierarchy() {
        let catalog = customer_schema();
        let adapter = RelationalSchemaAdapter::new(&catalog);
        let metadata = adapter
            .fetch_metadata(&targets(&["customer", "user"]))
            .await
            .unwrap();

        assert_eq!(metadata.root(), "customer");
        assert_eq!(metadata.hierarchy.children_of("customer"), ["user".to_string()]);
        assert_eq!(metadata.hierarchy.walk(), vec!["customer", "user"]);

        // first table in target order owns shared column names
        assert_eq!(metadata.column_map.table_of("id"), Some("customer"));
        assert_eq!(metadata.column_map.table_of("customer_id"), Some("user"));

        assert_eq!(metadata.primary_keys("user"), Some(&["customer_id".to_string()][..]));
        let fk = metadata.foreign_key("user").unwrap();
        assert_eq!(fk.table_to, "customer");
        assert!(metadata.foreign_key("customer").is_none());
    }

    #[tokio::test]
    async fn test_unknown_table_fails() {
        let catalog = customer_schema();
        let adapter = RelationalSchemaAdapter::new(&catalog);
        let err = adapter
            .fetch_metadata(&targets(&["customer", "missing"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::SchemaLookup(_)));
    }

    #[tokio::test]
    async fn test_empty_target_list_fails() {
        let catalog = customer_schema();
        let adapter = RelationalSchemaAdapter::new(&catalog);
        assert!(matches!(
            adapter.fetch_metadata(&[]).await,
            Err(ModelError::SchemaLookup(_))
        ));
    }

    #[test]
    fn test_primary_key_constraints_merge() {
        let description = TableDescription::new("tag")
            .column("a", "int4")
            .column("b", "int4")
            .primary_key(&["a"])
            .primary_key(&["a", "b"]);

        let metadata = normalize(&targets(&["tag"]), &[description]).unwrap();
        assert_eq!(
            metadata.primary_keys("tag"),
            Some(&["a".to_string(), "b".to_string()][..])
        );
    }

    #[test]
    fn test_deep_chain_is_followed() {
        let descriptions = vec![
            TableDescription::new("a").column("id", "int4").primary_key(&["id"]),
            TableDescription::new("b")
                .column("a_id", "int4")
                .primary_key(&["a_id"])
                .foreign_key(&["a_id"], "a", &["id"]),
            TableDescription::new("c")
                .column("b_id", "int4")
                .primary_key(&["b_id"])
                .foreign_key(&["b_id"], "b", &["a_id"]),
        ];

        let metadata = normalize(&targets(&["a", "b", "c"]), &descriptions).unwrap();
        assert_eq!(metadata.hierarchy.walk(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_foreign_keys_outside_targets_are_ignored() {
        let descriptions = vec![TableDescription::new("user")
            .column("id", "int4")
            .column("country_id", "int4")
            .primary_key(&["id"])
            .foreign_key(&["country_id"], "country", &["id"])];

        let metadata = normalize(&targets(&["user"]), &descriptions).unwrap();
        assert!(metadata.constraints.foreign.is_empty());
        assert_eq!(metadata.hierarchy.walk(), vec!["user"]);
    }

    #[test]
    fn test_cycles_are_rejected() {
        let descriptions = vec![
            TableDescription::new("a")
                .column("id", "int4")
                .primary_key(&["id"])
                .foreign_key(&["id"], "b", &["id"]),
            TableDescription::new("b")
                .column("id", "int4")
                .primary_key(&["id"])
                .foreign_key(&["id"], "a", &["id"]),
        ];

        assert!(matches!(
            normalize(&targets(&["a", "b"]), &descriptions),
            Err(ModelError::CyclicHierarchy(_))
        ));
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let descriptions = vec![TableDescription::new("category")
            .column("id", "int4")
            .column("parent_id", "int4")
            .primary_key(&["id"])
            .foreign_key(&["parent_id"], "category", &["id"])];

        assert!(matches!(
            normalize(&targets(&["category"]), &descriptions),
            Err(ModelError::CyclicHierarchy(_))
        ));
    }

    #[test]
    fn test_unreachable_target_is_rejected() {
        let descriptions = vec![
            TableDescription::new("a").column("id", "int4").primary_key(&["id"]),
            TableDescription::new("b").column("id", "int4").primary_key(&["id"]),
        ];

        assert!(matches!(
            normalize(&targets(&["a", "b"]), &descriptions),
            Err(ModelError::Configuration(_))
        ));
    }
}
