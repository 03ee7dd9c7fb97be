//! Relationship specifications
//!
//! Validated form of a `Relationship` annotation. The permitted and required
//! key sets depend on the relationship type and are checked before a spec
//! can reach the metadata cache.

use std::fmt;
use std::str::FromStr;

use crate::errors::{ModelError, Result};
use crate::validation::validate_identifier;

const VALID_KEYS: &[&str] = &[
    "name",
    "model",
    "type",
    "mappedKey",
    "mappedBy",
    "foreignKey",
    "foreignBy",
    "referencedBy",
    "referencedOrder",
];

const DIRECT_REQUIRED: &[&str] = &["name", "model", "type", "mappedKey", "mappedBy"];

const MANY_TO_MANY_REQUIRED: &[&str] = &[
    "name",
    "model",
    "type",
    "mappedKey",
    "mappedBy",
    "foreignKey",
    "foreignBy",
    "referencedBy",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipKind {
    ToOne,
    ToMany,
    ManyToMany,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::ToOne => "toOne",
            RelationshipKind::ToMany => "toMany",
            RelationshipKind::ManyToMany => "manyToMany",
        }
    }

    fn required_keys(&self) -> &'static [&'static str] {
        match self {
            RelationshipKind::ToOne | RelationshipKind::ToMany => DIRECT_REQUIRED,
            RelationshipKind::ManyToMany => MANY_TO_MANY_REQUIRED,
        }
    }

    /// Whether resolving this relationship can yield more than one object
    pub fn is_many(&self) -> bool {
        !matches!(self, RelationshipKind::ToOne)
    }
}

impl FromStr for RelationshipKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "toOne" => Ok(RelationshipKind::ToOne),
            "toMany" => Ok(RelationshipKind::ToMany),
            "manyToMany" => Ok(RelationshipKind::ManyToMany),
            other => Err(ModelError::Configuration(format!(
                "Invalid type of relationship \"{}\" defined in Relationship annotation",
                other
            ))),
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join-table addressing of a many-to-many relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTableSpec {
    /// Column on the owning table the join table points at
    pub foreign_key: String,
    /// Join table column pointing at the owning table
    pub foreign_by: String,
    /// Join table name
    pub referenced_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipSpec {
    pub name: String,
    pub model: String,
    pub kind: RelationshipKind,
    /// Property on the owning object supplying the match value
    pub mapped_key: String,
    /// Column on the related side matched against `mapped_key`
    pub mapped_by: String,
    pub join_table: Option<JoinTableSpec>,
    pub referenced_order: Option<String>,
    pairs: Vec<(String, String)>,
}

impl RelationshipSpec {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self> {
        for (index, (key, value)) in pairs.iter().enumerate() {
            if !VALID_KEYS.contains(&key.as_str()) {
                return Err(ModelError::Configuration(format!(
                    "Invalid definition of \"{}\" in Relationship annotation",
                    key
                )));
            }
            if value.trim().is_empty() {
                return Err(ModelError::Configuration(format!(
                    "Empty value for \"{}\" in Relationship annotation",
                    key
                )));
            }
            if pairs[..index].iter().any(|(seen, _)| seen == key) {
                return Err(ModelError::Configuration(format!(
                    "Duplicate definition of \"{}\" in Relationship annotation",
                    key
                )));
            }
        }

        let lookup = |key: &str| {
            pairs
                .iter()
                .find(|(candidate, _)| candidate == key)
                .map(|(_, value)| value.clone())
        };

        let kind: RelationshipKind = lookup("type")
            .ok_or_else(|| {
                ModelError::Configuration(format!(
                    "Required type missing from Relationship annotation. Given \"{}\"",
                    pairs
                        .iter()
                        .map(|(key, _)| key.as_str())
                        .collect::<Vec<_>>()
                        .join(",")
                ))
            })?
            .parse()?;

        let missing: Vec<&str> = kind
            .required_keys()
            .iter()
            .copied()
            .filter(|key| lookup(key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ModelError::Configuration(format!(
                "Required data for \"{}\" missing from Relationship annotation",
                missing.join(",")
            )));
        }

        // Present for every kind once the required-key check passed
        let required = |key: &str| {
            lookup(key).ok_or_else(|| {
                ModelError::Configuration(format!(
                    "Required data for \"{}\" missing from Relationship annotation",
                    key
                ))
            })
        };

        let mapped_by = required("mappedBy")?;
        validate_identifier(&mapped_by)?;

        let join_table = match kind {
            RelationshipKind::ManyToMany => {
                let join_table = JoinTableSpec {
                    foreign_key: required("foreignKey")?,
                    foreign_by: required("foreignBy")?,
                    referenced_by: required("referencedBy")?,
                };
                validate_identifier(&join_table.foreign_key)?;
                validate_identifier(&join_table.foreign_by)?;
                validate_identifier(&join_table.referenced_by)?;
                Some(join_table)
            }
            _ => None,
        };

        Ok(Self {
            name: required("name")?,
            model: required("model")?,
            kind,
            mapped_key: required("mappedKey")?,
            mapped_by,
            join_table,
            referenced_order: lookup("referencedOrder"),
            pairs,
        })
    }

    /// The key/value pairs exactly as supplied
    pub fn get_relationship(&self) -> &[(String, String)] {
        &self.pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn roles() -> Vec<(String, String)> {
        pairs(&[
            ("name", "Roles"),
            ("model", "Role"),
            ("type", "manyToMany"),
            ("mappedKey", "id"),
            ("mappedBy", "User_id"),
            ("foreignKey", "id"),
            ("foreignBy", "Role_id"),
            ("referencedBy", "moduledev_user_role"),
            ("referencedOrder", "sort"),
        ])
    }

    #[test]
    fn test_valid_payloads_round_trip() {
        let to_one = pairs(&[
            ("name", "Customer"),
            ("model", "Customer"),
            ("type", "toOne"),
            ("mappedKey", "customer_id"),
            ("mappedBy", "id"),
        ]);
        let spec = RelationshipSpec::from_pairs(to_one.clone()).unwrap();
        assert_eq!(spec.kind, RelationshipKind::ToOne);
        assert_eq!(spec.get_relationship(), to_one.as_slice());
        assert!(spec.join_table.is_none());

        let spec = RelationshipSpec::from_pairs(roles()).unwrap();
        assert_eq!(spec.kind, RelationshipKind::ManyToMany);
        assert_eq!(spec.get_relationship(), roles().as_slice());
        let join_table = spec.join_table.unwrap();
        assert_eq!(join_table.referenced_by, "moduledev_user_role");
        assert_eq!(spec.referenced_order.as_deref(), Some("sort"));
    }

    #[test]
    fn test_every_required_key_is_enforced() {
        for omitted in MANY_TO_MANY_REQUIRED {
            let payload: Vec<_> = roles()
                .into_iter()
                .filter(|(key, _)| key != omitted)
                .collect();
            assert!(
                RelationshipSpec::from_pairs(payload).is_err(),
                "omitting {} should fail",
                omitted
            );
        }
    }

    #[test]
    fn test_join_keys_not_required_for_direct_relationships() {
        let payload = pairs(&[
            ("name", "Posts"),
            ("model", "Post"),
            ("type", "toMany"),
            ("mappedKey", "id"),
            ("mappedBy", "user_id"),
        ]);
        assert!(RelationshipSpec::from_pairs(payload).is_ok());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let mut payload = roles();
        payload.push(("cascade".to_string(), "delete".to_string()));
        let err = RelationshipSpec::from_pairs(payload).unwrap_err();
        assert!(err.to_string().contains("cascade"));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let payload: Vec<_> = roles()
            .into_iter()
            .map(|(key, value)| {
                if key == "type" {
                    (key, "ManytoMany".to_string())
                } else {
                    (key, value)
                }
            })
            .collect();
        assert!(RelationshipSpec::from_pairs(payload).is_err());
    }

    #[test]
    fn test_empty_and_duplicate_values_are_rejected() {
        let mut payload = roles();
        payload[0].1 = " ".to_string();
        assert!(RelationshipSpec::from_pairs(payload).is_err());

        let mut payload = roles();
        payload.push(("name".to_string(), "Again".to_string()));
        assert!(RelationshipSpec::from_pairs(payload).is_err());
    }
}
