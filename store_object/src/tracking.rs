//! Change tracking
//!
//! Compares an object's current field values with the clean snapshot taken
//! at the last hydrate or successful write.

use std::collections::BTreeMap;

use type_mapping::PostgresValue;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeTracker {
    clean: BTreeMap<String, PostgresValue>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_clean_data<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (String, PostgresValue)>,
    {
        self.clean = values.into_iter().collect();
    }

    pub fn clean_data(&self) -> &BTreeMap<String, PostgresValue> {
        &self.clean
    }

    /// Changed fields with their current values, or their clean values when
    /// `use_original` is set
    ///
    /// A field counts as changed when it is missing from the other side or
    /// its value differs. Compound values never count as changed.
    pub fn get_changes(
        &self,
        current: &[(String, PostgresValue)],
        use_original: bool,
    ) -> BTreeMap<String, PostgresValue> {
        if use_original {
            self.clean
                .iter()
                .filter(|(field, old)| {
                    let new = current
                        .iter()
                        .find(|(name, _)| name == *field)
                        .map(|(_, value)| value);
                    differs(Some(*old), new)
                })
                .map(|(field, old)| (field.clone(), old.clone()))
                .collect()
        } else {
            current
                .iter()
                .filter(|(field, new)| differs(Some(new), self.clean.get(field)))
                .map(|(field, new)| (field.clone(), new.clone()))
                .collect()
        }
    }

    /// Any change when `field` is `None`, otherwise whether that field changed
    pub fn is_changed(&self, current: &[(String, PostgresValue)], field: Option<&str>) -> bool {
        let changes = self.get_changes(current, false);
        match field {
            None => !changes.is_empty(),
            Some(field) => changes.contains_key(field),
        }
    }
}

fn differs(base: Option<&PostgresValue>, other: Option<&PostgresValue>) -> bool {
    match (base, other) {
        (Some(_), None) => true,
        (Some(a), Some(b)) => {
            if a.is_compound() || b.is_compound() {
                return false;
            }
            a != b
        }
        (None, _) => false,
    }
}
