//! Annotation records
//!
//! A model class describes itself as an ordered list of annotations. The
//! derive macro produces them; hand-written models may build them directly.

use serde::{Deserialize, Serialize};
use type_mapping::FieldType;

use crate::errors::{ModelError, Result};

/// One typed annotation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Annotation {
    /// Ordered table names, root first
    Target(Vec<String>),
    /// Declared type tag of one property
    Field {
        property: String,
        field_type: String,
    },
    /// Raw relationship key/value pairs
    Relationship(Vec<(String, String)>),
}

impl Annotation {
    pub fn target<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Annotation::Target(tables.into_iter().map(Into::into).collect())
    }

    pub fn field(property: impl Into<String>, field_type: impl Into<String>) -> Self {
        Annotation::Field {
            property: property.into(),
            field_type: field_type.into(),
        }
    }

    pub fn relationship<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Annotation::Relationship(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// A validated `Field` annotation payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAnnotation {
    field_type: FieldType,
}

impl FieldAnnotation {
    pub fn new(tag: &str) -> Result<Self> {
        let field_type = tag.parse::<FieldType>().map_err(|_| {
            ModelError::Configuration(format!(
                "Field type must be one of [{}], '{}' given",
                FieldType::ALL
                    .iter()
                    .map(FieldType::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
                tag
            ))
        })?;

        Ok(Self { field_type })
    }

    /// The tag exactly as supplied
    pub fn get_field(&self) -> &'static str {
        self.field_type.as_str()
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }
}
