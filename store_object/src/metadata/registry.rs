use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::errors::{ModelError, Result};
use crate::metadata::model::ModelMetadata;

/// Append-only metadata cache keyed by model name
///
/// Entries are written at most once; a second registration for the same
/// model returns the entry already cached.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    entries: RwLock<HashMap<&'static str, Arc<ModelMetadata>>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, model: &str) -> Result<Option<Arc<ModelMetadata>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| ModelError::lock_poisoned("metadata registry"))?;
        Ok(entries.get(model).cloned())
    }

    /// Cache `metadata` unless an entry exists; returns the cached entry
    pub fn register(&self, model: &'static str, metadata: ModelMetadata) -> Result<Arc<ModelMetadata>> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ModelError::lock_poisoned("metadata registry"))?;
        let entry = entries
            .entry(model)
            .or_insert_with(|| Arc::new(metadata));
        Ok(entry.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Annotation;
    use signal_system::SignalManager;

    fn metadata(table: &str) -> ModelMetadata {
        ModelMetadata::from_annotations(
            "User",
            &[Annotation::target([table])],
            false,
            &SignalManager::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_first_writer_wins() {
        let registry = MetadataRegistry::new();
        assert!(registry.get("User").unwrap().is_none());

        let first = registry.register("User", metadata("moduledev_user")).unwrap();
        let second = registry.register("User", metadata("other_user")).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.target, vec!["moduledev_user"]);
        assert_eq!(registry.len(), 1);
    }
}
