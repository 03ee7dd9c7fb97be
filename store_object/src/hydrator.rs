//! Row hydration
//!
//! Populates model instances from result rows. Each row passes through the
//! `preHydrate` listeners (which may rewrite it), then every column is cast
//! onto its declared field or kept as an unmapped property.

use std::collections::HashSet;

use signal_system::{CastPipeline, CastRequest, EventType, ModelEvent, SignalManager};
use type_mapping::{coerce, PostgresValue};

use crate::errors::Result;
use crate::executor::Row;
use crate::metadata::ModelMetadata;
use crate::model::{Entity, Model};

#[derive(Debug, Clone, Copy)]
pub struct Hydrator<'h> {
    signals: &'h SignalManager,
    casts: &'h CastPipeline,
}

impl<'h> Hydrator<'h> {
    pub fn new(signals: &'h SignalManager, casts: &'h CastPipeline) -> Self {
        Self { signals, casts }
    }

    /// Hydrate a fresh instance of `T`
    pub fn hydrate_new<T: Model>(&self, row: Row, metadata: &ModelMetadata) -> Result<T> {
        let mut target = T::default();
        self.hydrate(row, &mut target, metadata)?;
        Ok(target)
    }

    /// Populate `target` from `row`
    ///
    /// A declared field takes the first column of its name; later duplicates
    /// and undeclared columns land in the unmapped side-table, which is
    /// replaced on every hydrate. Change-tracked objects are marked clean.
    pub fn hydrate(&self, row: Row, target: &mut dyn Entity, metadata: &ModelMetadata) -> Result<()> {
        // Halting only stops later listeners; hydration still runs
        let mut event = ModelEvent::new(EventType::PreHydrate, metadata.model.as_str())
            .with_data(row.into_pairs());
        self.signals.emit(&mut event)?;

        target.unmapped_properties_mut().clear();
        let mut populated: HashSet<String> = HashSet::new();
        for (column, value) in &event.data {
            if target.has_declared_field(column) && !populated.contains(column) {
                let value = self.cast(metadata, column, value.clone())?;
                target.set_field(column, value)?;
                populated.insert(column.clone());
            } else {
                target.unmapped_properties_mut().set(column, value.clone());
            }
        }

        let mut event = event.advance(EventType::Hydrate);
        self.signals.emit(&mut event)?;

        target.mark_clean();

        let mut event = event.advance(EventType::PostHydrate);
        self.signals.emit(&mut event)?;

        trace_log!(
            "[HYDRATE] {}: {} fields, {} unmapped",
            metadata.model,
            populated.len(),
            target.unmapped_properties().len()
        );

        Ok(())
    }

    /// Cast stages first, then the built-in coercion table
    ///
    /// Only fields with a declared type are cast; others pass through.
    fn cast(&self, metadata: &ModelMetadata, field: &str, value: PostgresValue) -> Result<PostgresValue> {
        let Some(field_type) = metadata.field_type(field) else {
            return Ok(value);
        };

        let request = CastRequest {
            model: &metadata.model,
            field,
            field_type,
            value: &value,
        };
        if let Some(claimed) = self.casts.cast(&request)? {
            return Ok(claimed);
        }

        Ok(coerce(value, field_type)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ModelError;
    use crate::testing::models::{Customer, User};
    use chrono::{TimeZone, Utc};
    use signal_system::{CastOutcome, HookOutcome};
    use type_mapping::FieldType;

    fn user_metadata(signals: &SignalManager) -> ModelMetadata {
        ModelMetadata::from_annotations(User::MODEL_NAME, &User::annotations(), true, signals).unwrap()
    }

    #[test]
    fn test_unmapped_columns_are_kept() {
        let signals = SignalManager::new();
        let casts = CastPipeline::new();
        let metadata = user_metadata(&signals);

        let row = Row::new().with("forename", "John").with("extra_col", "x");
        let user: User = Hydrator::new(&signals, &casts).hydrate_new(row, &metadata).unwrap();

        assert_eq!(user.forename, "John");
        assert_eq!(
            user.unmapped_properties().get("extra_col"),
            Some(&PostgresValue::from("x"))
        );
    }

    #[test]
    fn test_first_occurrence_of_a_field_wins() {
        let signals = SignalManager::new();
        let casts = CastPipeline::new();
        let metadata = user_metadata(&signals);

        let row = Row::new().with("forename", "John").with("forename", "Jack");
        let user: User = Hydrator::new(&signals, &casts).hydrate_new(row, &metadata).unwrap();

        assert_eq!(user.forename, "John");
        assert_eq!(
            user.unmapped_properties().get("forename"),
            Some(&PostgresValue::from("Jack"))
        );
    }

    #[test]
    fn test_declared_types_are_coerced() {
        let signals = SignalManager::new();
        let casts = CastPipeline::new();
        let metadata = user_metadata(&signals);

        let row = Row::new()
            .with("id", 4i64)
            .with("created_at", "2013-05-01 12:30:00");
        let user: User = Hydrator::new(&signals, &casts).hydrate_new(row, &metadata).unwrap();

        assert_eq!(user.id, Some(4));
        assert_eq!(
            user.created_at,
            Some(Utc.with_ymd_and_hms(2013, 5, 1, 12, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_unparseable_datetime_aborts_the_row() {
        let signals = SignalManager::new();
        let casts = CastPipeline::new();
        let metadata = user_metadata(&signals);

        let row = Row::new().with("created_at", "yesterday-ish");
        let result: Result<User> = Hydrator::new(&signals, &casts).hydrate_new(row, &metadata);

        assert!(matches!(result, Err(ModelError::Coercion(_))));
    }

    #[test]
    fn test_cast_stage_claims_before_coercion() {
        let signals = SignalManager::new();
        let casts = CastPipeline::new();
        casts.add_stage(|request| {
            if request.field_type == FieldType::String && request.field == "surname" {
                let upper = request.value.as_str().unwrap_or_default().to_uppercase();
                return Ok(CastOutcome::Claim(PostgresValue::Text(upper)));
            }
            Ok(CastOutcome::Pass)
        });
        let metadata = user_metadata(&signals);

        let row = Row::new().with("forename", "John").with("surname", "Smith");
        let user: User = Hydrator::new(&signals, &casts).hydrate_new(row, &metadata).unwrap();

        assert_eq!(user.forename, "John");
        assert_eq!(user.surname, "SMITH");
    }

    #[test]
    fn test_pre_hydrate_listener_rewrites_the_row() {
        let signals = SignalManager::new();
        let casts = CastPipeline::new();
        let metadata = user_metadata(&signals);
        signals.add_callback(EventType::PreHydrate, |event| {
            for (column, _) in event.data.iter_mut() {
                if column == "first_name" {
                    *column = "forename".to_string();
                }
            }
            Ok(HookOutcome::Pass)
        });

        let row = Row::new().with("first_name", "Ann");
        let user: User = Hydrator::new(&signals, &casts).hydrate_new(row, &metadata).unwrap();

        assert_eq!(user.forename, "Ann");
        assert!(user.unmapped_properties().is_empty());
    }

    #[test]
    fn test_hydration_marks_tracked_objects_clean() {
        let signals = SignalManager::new();
        let casts = CastPipeline::new();
        let metadata = user_metadata(&signals);

        let row = Row::new().with("forename", "John").with("surname", "Smith");
        let mut user: User = Hydrator::new(&signals, &casts).hydrate_new(row, &metadata).unwrap();
        assert!(user.changes(false).is_empty());

        user.forename = "Jack".to_string();
        let changes = user.changes(false);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get("forename"), Some(&PostgresValue::from("Jack")));
        assert_eq!(
            user.changes(true).get("forename"),
            Some(&PostgresValue::from("John"))
        );
    }

    #[test]
    fn test_untyped_fields_pass_through() {
        let signals = SignalManager::new();
        let casts = CastPipeline::new();
        let metadata =
            ModelMetadata::from_annotations(Customer::MODEL_NAME, &Customer::annotations(), false, &signals)
                .unwrap();

        let row = Row::new().with("discount", 0.25f64).with("id", 9i64);
        let customer: Customer = Hydrator::new(&signals, &casts).hydrate_new(row, &metadata).unwrap();

        assert_eq!(customer.discount, Some(0.25));
        assert_eq!(customer.id, Some(9));
    }
}
