//! Persistence coordination
//!
//! Objects queued with `persist` are flushed by `write`, one object at a
//! time. Each object's tables are written root first so generated parent
//! keys are available to the foreign-key-bound keys of dependent tables.

use std::collections::BTreeMap;
use std::sync::Arc;

use signal_system::{EventType, HookOutcome, ModelEvent, SignalManager};
use type_mapping::PostgresValue;

use crate::errors::{ModelError, Result};
use crate::executor::{Executor, Statement};
use crate::metadata::ModelMetadata;
use crate::model::Entity;
use crate::query_builder::SqlGenerator;
use crate::schema::{ForeignKey, RelationalMetadata};

/// Columns maintained by the database, never written from the object
const TIMESTAMP_COLUMNS: &[&str] = &["createdAt", "updatedAt", "created_at", "updated_at"];

/// A model instance shared between the caller and the pending set
pub type SharedEntity = Arc<tokio::sync::Mutex<dyn Entity>>;

/// How a queued object treats a changed primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// A changed primary key is an error
    #[default]
    Standard,
    /// Move the row: `UPDATE ... SET pk = new WHERE pk = old`
    Rekey,
}

#[derive(Clone)]
pub struct PendingEntry {
    pub entity: SharedEntity,
    pub metadata: Arc<ModelMetadata>,
    pub mode: WriteMode,
}

impl std::fmt::Debug for PendingEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingEntry")
            .field("model", &self.metadata.model)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Objects awaiting `write`, in queue order, unique by identity
#[derive(Debug, Clone, Default)]
pub struct PendingWrites {
    entries: Vec<PendingEntry>,
}

impl PendingWrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, entity: &SharedEntity) -> bool {
        self.entries
            .iter()
            .any(|entry| Arc::ptr_eq(&entry.entity, entity))
    }

    /// Queue `entity`; returns `false` when it is already queued
    pub fn add(&mut self, entity: SharedEntity, metadata: Arc<ModelMetadata>, mode: WriteMode) -> bool {
        if self.contains(&entity) {
            return false;
        }
        self.entries.push(PendingEntry {
            entity,
            metadata,
            mode,
        });
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn front(&self) -> Option<PendingEntry> {
        self.entries.first().cloned()
    }

    fn pop_front(&mut self) {
        if !self.entries.is_empty() {
            self.entries.remove(0);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowAction {
    Insert,
    Update,
    Rekey,
}

pub struct PersistenceCoordinator<'c> {
    executor: &'c dyn Executor,
    signals: &'c SignalManager,
}

impl<'c> PersistenceCoordinator<'c> {
    pub fn new(executor: &'c dyn Executor, signals: &'c SignalManager) -> Self {
        Self { executor, signals }
    }

    /// Queue an object for the next `write`
    ///
    /// Returns `false` when a `prePersist` listener halted; an object that is
    /// already queued is left where it is.
    pub fn persist(
        &self,
        pending: &mut PendingWrites,
        entity: SharedEntity,
        metadata: Arc<ModelMetadata>,
        mode: WriteMode,
    ) -> Result<bool> {
        if pending.contains(&entity) {
            return Ok(true);
        }

        let mut event = ModelEvent::new(EventType::PrePersist, metadata.model.as_str())
            .with_payload("model", metadata.model.as_str())
            .with_payload("pending", pending.len() as i64);
        if let HookOutcome::Halt(reason) = self.signals.emit(&mut event)? {
            debug_log!("[PERSIST] {} not queued: {}", metadata.model, reason);
            return Ok(false);
        }

        pending.add(entity, metadata, mode);

        let mut event = event.advance(EventType::PostPersist);
        event.add_payload("pending", pending.len() as i64);
        self.signals.emit(&mut event)?;

        Ok(true)
    }

    /// Flush every queued object in queue order
    ///
    /// Each object leaves the queue once its rows are written. On error the
    /// failing object and everything after it stay queued.
    pub async fn write(&self, pending: &mut PendingWrites) -> Result<usize> {
        let mut written = 0;
        while let Some(entry) = pending.front() {
            self.write_entry(&entry).await?;
            pending.pop_front();
            written += 1;
        }
        Ok(written)
    }

    async fn write_entry(&self, entry: &PendingEntry) -> Result<()> {
        let metadata = &entry.metadata;
        let relational = metadata.relational()?;
        let mut guard = entry.entity.lock().await;
        let entity: &mut dyn Entity = &mut *guard;

        let mut event = ModelEvent::new(EventType::PreWrite, metadata.model.as_str())
            .with_payload("model", metadata.model.as_str())
            .with_payload(
                "targets",
                PostgresValue::Array(
                    relational
                        .targets
                        .iter()
                        .cloned()
                        .map(PostgresValue::Text)
                        .collect(),
                ),
            );
        if let HookOutcome::Halt(reason) = self.signals.emit(&mut event)? {
            return Err(ModelError::ValidationFailed {
                model: metadata.model.clone(),
                reason,
            });
        }

        if entity.tracks_changes() && !entity.is_changed(None) {
            debug_log!("[WRITE] {} unchanged, skipping", metadata.model);
        } else {
            let originals = entity.changes(true);
            let mut inserted: Vec<String> = Vec::new();
            for table in relational.hierarchy.walk() {
                // Rows hanging off a freshly inserted row are new as well
                let parent_inserted = relational
                    .foreign_key(&table)
                    .is_some_and(|fk| inserted.contains(&fk.table_to));
                let action = self
                    .write_table(entity, metadata, relational, &table, entry.mode, parent_inserted, &originals)
                    .await?;
                if action == RowAction::Insert {
                    inserted.push(table);
                }
            }
            entity.mark_clean();
        }

        let mut event = event.advance(EventType::PostWrite);
        self.signals.emit(&mut event)?;

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn write_table(
        &self,
        entity: &mut dyn Entity,
        metadata: &ModelMetadata,
        relational: &RelationalMetadata,
        table: &str,
        mode: WriteMode,
        parent_inserted: bool,
        originals: &BTreeMap<String, PostgresValue>,
    ) -> Result<RowAction> {
        let primary = relational
            .primary_keys(table)
            .filter(|keys| !keys.is_empty())
            .ok_or_else(|| ModelError::NoPrimaryKeys(table.to_string()))?;
        let foreign_key = relational.foreign_key(table);

        let keys: Vec<(String, PostgresValue)> = primary
            .iter()
            .map(|column| {
                let property = property_for(foreign_key, column);
                let value = entity.get_field(property).unwrap_or(PostgresValue::Null);
                (column.clone(), value)
            })
            .collect();

        let mut columns = Vec::new();
        for column in relational.column_map.columns_of(table) {
            if primary.contains(&column) || TIMESTAMP_COLUMNS.contains(&column.as_str()) {
                continue;
            }
            let value = entity.property(property_for(foreign_key, &column))?;
            columns.push((column, value));
        }

        // Tracked objects with a clean snapshot came from storage; anything
        // else needs a lookup to tell a new row from an existing one
        let persisted = entity
            .tracker()
            .is_some_and(|tracker| !tracker.clean_data().is_empty());

        let action = if parent_inserted || keys.iter().any(|(_, value)| value.is_null()) {
            RowAction::Insert
        } else if persisted {
            let key_changed = primary
                .iter()
                .any(|column| originals.contains_key(property_for(foreign_key, column)));
            match (key_changed, mode) {
                (false, _) => RowAction::Update,
                (true, WriteMode::Rekey) => RowAction::Rekey,
                (true, WriteMode::Standard) => {
                    return Err(ModelError::PrimaryKeyChanged {
                        model: metadata.model.clone(),
                        table: table.to_string(),
                    })
                }
            }
        } else if self.count_rows(table, &keys).await? > 0 {
            RowAction::Update
        } else {
            RowAction::Insert
        };

        debug_log!("[WRITE] {} on {}: {:?}", metadata.model, table, action);

        match action {
            RowAction::Insert => {
                let values: Vec<(String, PostgresValue)> = keys
                    .iter()
                    .chain(columns.iter())
                    .filter(|(_, value)| !value.is_null())
                    .cloned()
                    .collect();
                let statement = SqlGenerator::insert(table, &values, primary);
                let mut rows = self.executor.execute(&statement).await?;
                if let Some(generated) = rows.next_row() {
                    for column in primary {
                        if let Some(value) = generated.get(column) {
                            write_back(entity, property_for(foreign_key, column), value.clone())?;
                        }
                    }
                }
            }
            RowAction::Update => {
                if !columns.is_empty() {
                    self.run(SqlGenerator::update(table, &columns, &keys)).await?;
                }
            }
            RowAction::Rekey => {
                let old_keys: Vec<(String, PostgresValue)> = keys
                    .iter()
                    .map(|(column, current)| {
                        let property = property_for(foreign_key, column);
                        let old = originals.get(property).cloned().unwrap_or_else(|| current.clone());
                        (column.clone(), old)
                    })
                    .collect();
                let values: Vec<(String, PostgresValue)> =
                    keys.iter().chain(columns.iter()).cloned().collect();
                self.run(SqlGenerator::update(table, &values, &old_keys)).await?;
            }
        }

        Ok(action)
    }

    async fn count_rows(&self, table: &str, keys: &[(String, PostgresValue)]) -> Result<i64> {
        let mut rows = self
            .executor
            .execute(&SqlGenerator::count_by_keys(table, keys))
            .await?;
        Ok(rows
            .next_row()
            .and_then(|row| row.get("count").and_then(PostgresValue::as_i64))
            .unwrap_or(0))
    }

    async fn run(&self, statement: Statement) -> Result<()> {
        self.executor.execute(&statement).await?;
        Ok(())
    }
}

/// Object property holding `column`: the referenced column for
/// foreign-key-bound columns, the column itself otherwise
fn property_for<'a>(foreign_key: Option<&'a ForeignKey>, column: &'a str) -> &'a str {
    foreign_key
        .and_then(|fk| fk.referenced_column(column))
        .unwrap_or(column)
}

/// Store a generated key, keeping it as unmapped data when the object has no
/// such property
fn write_back(entity: &mut dyn Entity, property: &str, value: PostgresValue) -> Result<()> {
    if entity.has_declared_field(property) {
        entity.set_field(property, value)
    } else {
        entity.unmapped_properties_mut().set(property, value);
        Ok(())
    }
}
