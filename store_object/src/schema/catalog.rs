//! Schema catalog collaborator
//!
//! Raw table descriptions as the storage catalog reports them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    Primary,
    Foreign,
    Unique,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDescription {
    pub name: String,
    pub kind: ConstraintKind,
    pub table_name: String,
    pub columns: Vec<String>,
    pub referenced_table_name: Option<String>,
    pub referenced_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    pub name: String,
    pub columns: Vec<ColumnDescription>,
    pub constraints: Vec<ConstraintDescription>,
}

impl TableDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn column(mut self, name: &str, data_type: &str) -> Self {
        self.columns.push(ColumnDescription {
            name: name.to_string(),
            data_type: data_type.to_string(),
        });
        self
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.constraints.push(ConstraintDescription {
            name: format!("{}_pkey", self.name),
            kind: ConstraintKind::Primary,
            table_name: self.name.clone(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            referenced_table_name: None,
            referenced_columns: Vec::new(),
        });
        self
    }

    pub fn foreign_key(mut self, columns: &[&str], table_to: &str, referenced: &[&str]) -> Self {
        self.constraints.push(ConstraintDescription {
            name: format!("{}_{}_fkey", self.name, columns.join("_")),
            kind: ConstraintKind::Foreign,
            table_name: self.name.clone(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            referenced_table_name: Some(table_to.to_string()),
            referenced_columns: referenced.iter().map(|c| c.to_string()).collect(),
        });
        self
    }
}

/// Source of raw table descriptions
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    /// Describe one table; `None` when the table does not exist
    async fn describe_table(&self, name: &str) -> Result<Option<TableDescription>>;
}
