//! Normalized relational metadata of one model
//!
//! Built once from the live schema, then shared read-only by the query
//! builder and the persistence coordinator.

use std::collections::HashMap;

use crate::errors::{ModelError, Result};

/// Column name to owning table, first table in target order wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    entries: Vec<(String, String)>,
}

impl ColumnMap {
    /// Record `column` for `table` unless another table already owns it
    pub fn insert_if_absent(&mut self, column: &str, table: &str) -> bool {
        if self.table_of(column).is_some() {
            return false;
        }
        self.entries.push((column.to_string(), table.to_string()));
        true
    }

    pub fn table_of(&self, column: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, table)| table.as_str())
    }

    /// Columns owned by `table`, in schema order
    pub fn columns_of(&self, table: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, owner)| owner == table)
            .map(|(column, _)| column.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(column, table)| (column.as_str(), table.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Foreign key held by `table`, pointing at `table_to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: String,
    pub table_to: String,
    pub columns: Vec<String>,
    pub referenced_columns: Vec<String>,
}

impl ForeignKey {
    /// Local column to referenced column pairs
    pub fn column_reference_map(&self) -> Result<Vec<(&str, &str)>> {
        if self.columns.is_empty() || self.columns.len() != self.referenced_columns.len() {
            return Err(ModelError::ForeignKeyColumnMismatch {
                table: self.table.clone(),
                local: self.columns.len(),
                referenced: self.referenced_columns.len(),
            });
        }

        Ok(self
            .columns
            .iter()
            .map(String::as_str)
            .zip(self.referenced_columns.iter().map(String::as_str))
            .collect())
    }

    /// Referenced column for a local column, if the column is part of this key
    pub fn referenced_column(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|local| local == column)
            .and_then(|index| self.referenced_columns.get(index))
            .map(String::as_str)
    }

    /// Local column for a referenced column, if the column is part of this key
    pub fn local_column(&self, referenced: &str) -> Option<&str> {
        self.referenced_columns
            .iter()
            .position(|column| column == referenced)
            .and_then(|index| self.columns.get(index))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints {
    /// Table to ordered primary key columns
    pub primary: HashMap<String, Vec<String>>,
    /// Table holding the key to its foreign key record
    pub foreign: HashMap<String, ForeignKey>,
}

/// Tree of dependent tables rooted at the model's primary table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    root: String,
    children: HashMap<String, Vec<String>>,
}

impl Hierarchy {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            children: HashMap::new(),
        }
    }

    pub fn add_child(&mut self, parent: &str, child: &str) {
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(child.to_string());
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn children_of(&self, table: &str) -> &[String] {
        self.children
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every table, parents before their children
    pub fn walk(&self) -> Vec<String> {
        let mut order = Vec::new();
        self.walk_from(&self.root, &mut order);
        order
    }

    fn walk_from(&self, table: &str, order: &mut Vec<String>) {
        order.push(table.to_string());
        for child in self.children_of(table) {
            self.walk_from(child, order);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalMetadata {
    pub column_map: ColumnMap,
    pub constraints: Constraints,
    pub hierarchy: Hierarchy,
    pub targets: Vec<String>,
}

impl RelationalMetadata {
    pub fn root(&self) -> &str {
        self.hierarchy.root()
    }

    pub fn primary_keys(&self, table: &str) -> Option<&[String]> {
        self.constraints.primary.get(table).map(Vec::as_slice)
    }

    pub fn foreign_key(&self, table: &str) -> Option<&ForeignKey> {
        self.constraints.foreign.get(table)
    }
}
