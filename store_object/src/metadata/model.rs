use std::collections::BTreeMap;

use signal_system::{EventType, ModelEvent, SignalManager};
use type_mapping::{FieldType, PostgresValue};

use crate::errors::{ModelError, Result};
use crate::metadata::annotation::{Annotation, FieldAnnotation};
use crate::metadata::relationship::RelationshipSpec;
use crate::schema::RelationalMetadata;
use crate::validation::validate_identifier;

/// Everything derived about one model class
#[derive(Debug, Clone)]
pub struct ModelMetadata {
    pub model: String,
    /// Table names, root first; empty for classes without persistent mapping
    pub target: Vec<String>,
    pub fields: BTreeMap<String, FieldAnnotation>,
    pub relationships: BTreeMap<String, RelationshipSpec>,
    pub tracks_changes: bool,
    pub relational: Option<RelationalMetadata>,
}

impl ModelMetadata {
    /// Derive metadata from a class's annotation list
    ///
    /// `prepareModelMetadata` listeners see the target list as event data and
    /// may rewrite it; `prepareFieldMetadata` fires once per declared field.
    pub fn from_annotations(
        model: &str,
        annotations: &[Annotation],
        tracks_changes: bool,
        signals: &SignalManager,
    ) -> Result<Self> {
        let mut target: Option<Vec<String>> = None;
        let mut field_annotations = Vec::new();
        let mut relationships = BTreeMap::new();

        for annotation in annotations {
            match annotation {
                Annotation::Target(tables) => {
                    if target.is_some() {
                        return Err(ModelError::Configuration(format!(
                            "Model {} declares more than one Target annotation",
                            model
                        )));
                    }
                    target = Some(tables.clone());
                }
                Annotation::Field {
                    property,
                    field_type,
                } => field_annotations.push((property.clone(), field_type.clone())),
                Annotation::Relationship(pairs) => {
                    let spec = RelationshipSpec::from_pairs(pairs.clone())?;
                    if relationships.contains_key(&spec.name) {
                        return Err(ModelError::Configuration(format!(
                            "Model {} declares relationship {} twice",
                            model, spec.name
                        )));
                    }
                    relationships.insert(spec.name.clone(), spec);
                }
            }
        }

        let mut event = ModelEvent::new(EventType::PrepareModelMetadata, model)
            .with_payload("model", model)
            .with_payload("relationships", relationships.len() as i64)
            .with_data(vec![(
                "target".to_string(),
                PostgresValue::Array(
                    target
                        .unwrap_or_default()
                        .into_iter()
                        .map(PostgresValue::Text)
                        .collect(),
                ),
            )]);
        signals.emit(&mut event)?;
        let target = target_from_event(model, &event)?;

        for table in &target {
            validate_identifier(table)?;
        }

        let mut fields = BTreeMap::new();
        for (property, tag) in field_annotations {
            let annotation = FieldAnnotation::new(&tag)?;

            let mut event = ModelEvent::new(EventType::PrepareFieldMetadata, model)
                .with_payload("property", property.as_str())
                .with_payload("annotation", annotation.get_field());
            signals.emit(&mut event)?;

            if fields.insert(property.clone(), annotation).is_some() {
                return Err(ModelError::Configuration(format!(
                    "Model {} declares field {} twice",
                    model, property
                )));
            }
        }

        debug_log!(
            "[METADATA] Model: {}, targets: {:?}, fields: {}, relationships: {}",
            model,
            target,
            fields.len(),
            relationships.len()
        );

        Ok(Self {
            model: model.to_string(),
            target,
            fields,
            relationships,
            tracks_changes,
            relational: None,
        })
    }

    pub fn with_relational(mut self, relational: RelationalMetadata) -> Self {
        self.relational = Some(relational);
        self
    }

    pub fn is_persistent(&self) -> bool {
        !self.target.is_empty()
    }

    /// Relational metadata, or an error for classes without a target
    pub fn relational(&self) -> Result<&RelationalMetadata> {
        self.relational.as_ref().ok_or_else(|| {
            ModelError::Configuration(format!("Model {} has no persistent mapping", self.model))
        })
    }

    pub fn field_type(&self, property: &str) -> Option<FieldType> {
        self.fields.get(property).map(FieldAnnotation::field_type)
    }

    pub fn relationship(&self, name: &str) -> Result<&RelationshipSpec> {
        self.relationships.get(name).ok_or_else(|| {
            ModelError::Configuration(format!(
                "Model {} has no relationship named {}",
                self.model, name
            ))
        })
    }
}

fn target_from_event(model: &str, event: &ModelEvent) -> Result<Vec<String>> {
    match event.data_value("target") {
        Some(PostgresValue::Array(values)) => values
            .iter()
            .map(|value| {
                value.as_str().map(str::to_string).ok_or_else(|| {
                    ModelError::Configuration(format!(
                        "Target of model {} must be a list of table names",
                        model
                    ))
                })
            })
            .collect(),
        _ => Err(ModelError::Configuration(format!(
            "Target of model {} was removed during metadata preparation",
            model
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_system::HookOutcome;
    use std::sync::{Arc, Mutex};

    fn user_annotations() -> Vec<Annotation> {
        vec![
            Annotation::target(["moduledev_user"]),
            Annotation::field("forename", "string"),
            Annotation::field("createdAt", "datetime"),
            Annotation::relationship([
                ("name", "Roles"),
                ("model", "Role"),
                ("type", "manyToMany"),
                ("mappedKey", "id"),
                ("mappedBy", "User_id"),
                ("foreignKey", "id"),
                ("foreignBy", "Role_id"),
                ("referencedBy", "moduledev_user_role"),
                ("referencedOrder", "sort"),
            ]),
        ]
    }

    #[test]
    fn test_metadata_from_annotations() {
        let signals = SignalManager::new();
        let metadata =
            ModelMetadata::from_annotations("User", &user_annotations(), true, &signals).unwrap();

        assert_eq!(metadata.target, vec!["moduledev_user"]);
        assert_eq!(metadata.field_type("createdAt"), Some(FieldType::Datetime));
        assert_eq!(metadata.field_type("surname"), None);
        assert!(metadata.relationship("Roles").is_ok());
        assert!(metadata.relationship("Groups").is_err());
        assert!(metadata.is_persistent());
        assert!(metadata.relational().is_err());
    }

    #[test]
    fn test_invalid_field_tag_rejects_the_class() {
        let signals = SignalManager::new();
        let annotations = vec![
            Annotation::target(["moduledev_user"]),
            Annotation::field("forename", "varchar"),
        ];
        assert!(ModelMetadata::from_annotations("User", &annotations, false, &signals).is_err());
    }

    #[test]
    fn test_invalid_relationship_rejects_the_class() {
        let signals = SignalManager::new();
        let annotations = vec![Annotation::relationship([("name", "Roles"), ("type", "toOne")])];
        assert!(ModelMetadata::from_annotations("User", &annotations, false, &signals).is_err());
    }

    #[test]
    fn test_class_without_target_is_not_persistent() {
        let signals = SignalManager::new();
        let annotations = vec![Annotation::field("forename", "string")];
        let metadata =
            ModelMetadata::from_annotations("Draft", &annotations, false, &signals).unwrap();
        assert!(!metadata.is_persistent());
    }

    #[test]
    fn test_prepare_events_fire_in_order() {
        let signals = SignalManager::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = seen.clone();
        signals.add_callback(EventType::PrepareModelMetadata, move |event| {
            log.lock().unwrap().push(event.event_type.name().to_string());
            Ok(HookOutcome::Pass)
        });
        let log = seen.clone();
        signals.add_callback(EventType::PrepareFieldMetadata, move |event| {
            let property = event
                .payload_value("property")
                .and_then(|value| value.as_str())
                .unwrap_or_default()
                .to_string();
            log.lock().unwrap().push(property);
            Ok(HookOutcome::Pass)
        });

        ModelMetadata::from_annotations("User", &user_annotations(), true, &signals).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["prepareModelMetadata", "forename", "createdAt"]
        );
    }

    #[test]
    fn test_listeners_may_rewrite_the_target() {
        let signals = SignalManager::new();
        signals.add_callback(EventType::PrepareModelMetadata, |event| {
            event.data = vec![(
                "target".to_string(),
                PostgresValue::Array(vec![PostgresValue::from("archived_user")]),
            )];
            Ok(HookOutcome::Pass)
        });

        let metadata =
            ModelMetadata::from_annotations("User", &user_annotations(), true, &signals).unwrap();
        assert_eq!(metadata.target, vec!["archived_user"]);
    }
}
