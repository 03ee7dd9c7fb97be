//! Domain object capabilities
//!
//! [`Model`] is the static side of a mapped class: its annotations and a
//! per-class accessor table built once. [`Entity`] is the object-safe side
//! the hydrator and persistence coordinator work through.

use std::collections::BTreeMap;

use type_mapping::{CoercionError, PostgresValue};

use crate::errors::{ModelError, Result};
use crate::metadata::Annotation;
use crate::tracking::ChangeTracker;

/// Reads and writes one struct field as a [`PostgresValue`]
pub struct FieldAccessor<T> {
    pub name: &'static str,
    pub get: fn(&T) -> PostgresValue,
    pub set: fn(&mut T, PostgresValue) -> std::result::Result<(), CoercionError>,
}

/// Per-class accessor table
pub struct FieldAccessors<T> {
    fields: Vec<FieldAccessor<T>>,
}

impl<T> FieldAccessors<T> {
    pub fn new(fields: Vec<FieldAccessor<T>>) -> Self {
        Self { fields }
    }

    pub fn find(&self, name: &str) -> Option<&FieldAccessor<T>> {
        self.fields.iter().find(|accessor| accessor.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldAccessor<T>> {
        self.fields.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|accessor| accessor.name).collect()
    }
}

impl<T> std::fmt::Debug for FieldAccessors<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldAccessors")
            .field("fields", &self.names())
            .finish()
    }
}

/// Build a [`FieldAccessor`] for `$field` of `$ty`
#[macro_export]
macro_rules! model_field {
    ($ty:ty, $field:ident) => {
        $crate::model::FieldAccessor::<$ty> {
            name: stringify!($field),
            get: |model: &$ty| $crate::FieldValue::to_value(&model.$field),
            set: |model: &mut $ty, value| {
                model.$field = $crate::FieldValue::from_value(value)?;
                Ok(())
            },
        }
    };
}

/// Hydrated columns without a declared field, in arrival order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnmappedProperties {
    values: Vec<(String, PostgresValue)>,
}

impl UnmappedProperties {
    pub fn get(&self, name: &str) -> Option<&PostgresValue> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or replace
    pub fn set(&mut self, name: &str, value: PostgresValue) {
        match self.values.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((name.to_string(), value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PostgresValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Static description of a mapped class
pub trait Model: Default + Send + Sync + 'static {
    const MODEL_NAME: &'static str;

    /// Ordered annotation records describing the class
    fn annotations() -> Vec<Annotation>;

    fn accessors() -> &'static FieldAccessors<Self>;

    fn unmapped(&self) -> &UnmappedProperties;

    fn unmapped_mut(&mut self) -> &mut UnmappedProperties;

    /// Change tracking capability; `None` for untracked classes
    fn change_tracker(&self) -> Option<&ChangeTracker> {
        None
    }

    fn change_tracker_mut(&mut self) -> Option<&mut ChangeTracker> {
        None
    }
}

/// Object-safe view of a model instance
pub trait Entity: Send + Sync {
    fn model_name(&self) -> &'static str;

    /// Declared field value, then unmapped property
    fn get_field(&self, name: &str) -> Option<PostgresValue>;

    fn has_declared_field(&self, name: &str) -> bool;

    /// Write a declared field or an existing unmapped property
    fn set_field(&mut self, name: &str, value: PostgresValue) -> Result<()>;

    /// Current values of every declared field
    fn field_values(&self) -> Vec<(String, PostgresValue)>;

    fn unmapped_properties(&self) -> &UnmappedProperties;

    fn unmapped_properties_mut(&mut self) -> &mut UnmappedProperties;

    fn tracker(&self) -> Option<&ChangeTracker>;

    fn tracker_mut(&mut self) -> Option<&mut ChangeTracker>;

    /// Like [`Entity::get_field`], but a missing property is an error
    fn property(&self, name: &str) -> Result<PostgresValue> {
        self.get_field(name)
            .ok_or_else(|| ModelError::unknown_property(self.model_name(), name))
    }

    fn tracks_changes(&self) -> bool {
        self.tracker().is_some()
    }

    /// Changed fields; always empty for untracked objects
    fn changes(&self, use_original: bool) -> BTreeMap<String, PostgresValue> {
        match self.tracker() {
            Some(tracker) => tracker.get_changes(&self.field_values(), use_original),
            None => BTreeMap::new(),
        }
    }

    fn is_changed(&self, field: Option<&str>) -> bool {
        match self.tracker() {
            Some(tracker) => tracker.is_changed(&self.field_values(), field),
            None => false,
        }
    }

    /// Take the current field values as the clean baseline
    fn mark_clean(&mut self) {
        let values = self.field_values();
        if let Some(tracker) = self.tracker_mut() {
            tracker.set_clean_data(values);
        }
    }
}

impl<T: Model> Entity for T {
    fn model_name(&self) -> &'static str {
        T::MODEL_NAME
    }

    fn get_field(&self, name: &str) -> Option<PostgresValue> {
        match T::accessors().find(name) {
            Some(accessor) => Some((accessor.get)(self)),
            None => self.unmapped().get(name).cloned(),
        }
    }

    fn has_declared_field(&self, name: &str) -> bool {
        T::accessors().find(name).is_some()
    }

    fn set_field(&mut self, name: &str, value: PostgresValue) -> Result<()> {
        if let Some(accessor) = T::accessors().find(name) {
            return (accessor.set)(self, value).map_err(ModelError::from);
        }

        if self.unmapped().contains(name) {
            self.unmapped_mut().set(name, value);
            return Ok(());
        }

        Err(ModelError::unknown_property(T::MODEL_NAME, name))
    }

    fn field_values(&self) -> Vec<(String, PostgresValue)> {
        T::accessors()
            .iter()
            .map(|accessor| (accessor.name.to_string(), (accessor.get)(self)))
            .collect()
    }

    fn unmapped_properties(&self) -> &UnmappedProperties {
        self.unmapped()
    }

    fn unmapped_properties_mut(&mut self) -> &mut UnmappedProperties {
        self.unmapped_mut()
    }

    fn tracker(&self) -> Option<&ChangeTracker> {
        self.change_tracker()
    }

    fn tracker_mut(&mut self) -> Option<&mut ChangeTracker> {
        self.change_tracker_mut()
    }
}
