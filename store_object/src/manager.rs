//! Model manager
//!
//! Entry point tying metadata, query building, hydration and persistence
//! together over one schema catalog and one executor.

use std::sync::Arc;

use signal_system::{CastPipeline, SignalManager};
use tokio::sync::Mutex;

use crate::errors::{ModelError, Result};
use crate::executor::{BufferedRows, Executor, RowIterator};
use crate::metadata::{MetadataRegistry, ModelMetadata, RelationshipKind};
use crate::model::{Entity, Model};
use crate::persistence::{PendingWrites, PersistenceCoordinator, SharedEntity, WriteMode};
use crate::query_builder::{Criteria, ExtraJoin, QueryBuilder, QueryFilter, SqlGenerator};
use crate::result_set::{
    HydratingResultSet, HydrationContext, PaginatedResultSet, Related,
    UnbufferedHydratingResultSet,
};
use crate::schema::{RelationalSchemaAdapter, SchemaCatalog};

pub const DEFAULT_PAGE_SIZE: u64 = 10;

pub struct ModelManager {
    registry: MetadataRegistry,
    catalog: Arc<dyn SchemaCatalog>,
    executor: Arc<dyn Executor>,
    signals: Arc<SignalManager>,
    casts: Arc<CastPipeline>,
    pending: Mutex<PendingWrites>,
    default_page_size: u64,
    buffer_results: bool,
}

impl ModelManager {
    pub fn new(catalog: Arc<dyn SchemaCatalog>, executor: Arc<dyn Executor>) -> Self {
        Self {
            registry: MetadataRegistry::new(),
            catalog,
            executor,
            signals: Arc::new(SignalManager::new()),
            casts: Arc::new(CastPipeline::new()),
            pending: Mutex::new(PendingWrites::new()),
            default_page_size: DEFAULT_PAGE_SIZE,
            buffer_results: true,
        }
    }

    /// Use `signals` for every lifecycle event; register listeners before
    /// handing it over
    pub fn with_signals(mut self, signals: SignalManager) -> Self {
        self.signals = Arc::new(signals);
        self
    }

    pub fn with_casts(mut self, casts: CastPipeline) -> Self {
        self.casts = Arc::new(casts);
        self
    }

    /// Page size used by `find_paginated` when called with zero
    pub fn with_default_page_size(mut self, page_size: u64) -> Self {
        if page_size > 0 {
            self.default_page_size = page_size;
        }
        self
    }

    /// Whether unpaged many-valued relationships come back buffered
    pub fn with_buffered_results(mut self, buffer: bool) -> Self {
        self.buffer_results = buffer;
        self
    }

    pub fn signals(&self) -> &SignalManager {
        &self.signals
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    pub fn default_page_size(&self) -> u64 {
        self.default_page_size
    }

    /// Metadata for `T`, derived and cached on first use
    pub async fn metadata<T: Model>(&self) -> Result<Arc<ModelMetadata>> {
        if let Some(metadata) = self.registry.get(T::MODEL_NAME)? {
            return Ok(metadata);
        }

        let tracks_changes = T::default().change_tracker().is_some();
        let mut metadata = ModelMetadata::from_annotations(
            T::MODEL_NAME,
            &T::annotations(),
            tracks_changes,
            &self.signals,
        )?;

        if metadata.is_persistent() {
            let relational = RelationalSchemaAdapter::new(self.catalog.as_ref())
                .fetch_metadata(&metadata.target)
                .await?;
            metadata = metadata.with_relational(relational);
        }

        debug_log!("[MANAGER] Registered metadata for {}", T::MODEL_NAME);
        self.registry.register(T::MODEL_NAME, metadata)
    }

    /// Every matching object, rows buffered
    pub async fn find_all<T: Model>(&self, criteria: Criteria) -> Result<HydratingResultSet<T>> {
        let (rows, context) = self.select::<T>(criteria).await?;
        Ok(HydratingResultSet::new(rows.buffer(), context))
    }

    /// Every matching object, hydrated as the driver hands rows over
    pub async fn find_all_unbuffered<T: Model>(
        &self,
        criteria: Criteria,
    ) -> Result<UnbufferedHydratingResultSet<T>> {
        let (rows, context) = self.select::<T>(criteria).await?;
        Ok(UnbufferedHydratingResultSet::new(rows, context))
    }

    /// First matching object, or `None`
    pub async fn find_one<T: Model>(&self, mut criteria: Criteria) -> Result<Option<T>> {
        criteria.set_limit(Some(1))?;
        let mut results = self.find_all::<T>(criteria).await?;
        results.next().transpose()
    }

    /// Number of matching rows, ignoring limit and offset
    pub async fn count_all<T: Model>(&self, mut criteria: Criteria) -> Result<u64> {
        let metadata = self.metadata_for::<T>(&criteria).await?;
        let spec = QueryBuilder::new(metadata.relational()?).build_count_query(&mut criteria)?;
        let mut rows = self.executor.execute(&SqlGenerator::select(&spec)).await?;

        let count = rows
            .next_row()
            .and_then(|row| row.get("count").and_then(|value| value.as_i64()))
            .unwrap_or(0);
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Matching objects fetched `page_size` rows at a time; zero selects the
    /// default page size
    pub fn find_paginated<T: Model>(
        &self,
        criteria: Criteria,
        page_size: u64,
    ) -> Result<PaginatedResultSet<'_, T>> {
        let page_size = if page_size == 0 {
            self.default_page_size
        } else {
            page_size
        };
        PaginatedResultSet::new(self, criteria, page_size)
    }

    /// Queue `object` for the next `write`
    ///
    /// Returns `false` when a `prePersist` listener refused it.
    pub async fn persist<T: Model>(&self, object: &Arc<Mutex<T>>) -> Result<bool> {
        self.queue(object, WriteMode::Standard).await
    }

    /// Queue `object`, allowing its primary key to move the stored row
    pub async fn persist_rekey<T: Model>(&self, object: &Arc<Mutex<T>>) -> Result<bool> {
        self.queue(object, WriteMode::Rekey).await
    }

    /// Flush the pending objects; returns how many were written
    pub async fn write(&self) -> Result<usize> {
        let mut pending = self.pending.lock().await;
        PersistenceCoordinator::new(self.executor.as_ref(), &self.signals)
            .write(&mut pending)
            .await
    }

    pub async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Resolve relationship `name` of `object` into objects of `R`
    ///
    /// toOne yields [`Related::One`]. Many-valued relationships are paged
    /// when `page_size` is positive, otherwise buffered or unbuffered as
    /// configured.
    pub async fn get_relationship<T: Model, R: Model>(
        &self,
        object: &T,
        name: &str,
        page_size: u64,
    ) -> Result<Related<'_, R>> {
        let metadata = self.metadata::<T>().await?;
        let spec = metadata.relationship(name)?;

        if spec.model != R::MODEL_NAME {
            return Err(ModelError::Configuration(format!(
                "Relationship {} of {} resolves to {}, not {}",
                name,
                T::MODEL_NAME,
                spec.model,
                R::MODEL_NAME
            )));
        }

        let key = object.property(&spec.mapped_key)?;
        // An owner without a key has nothing related to it
        if key.is_null() {
            debug_log!(
                "[MANAGER] {}.{} has no {}, nothing to resolve",
                T::MODEL_NAME,
                name,
                spec.mapped_key
            );
            return self.unresolved_relationship::<R>(spec.kind, page_size).await;
        }

        let mut criteria = Criteria::for_model::<R>()?;
        match &spec.join_table {
            Some(join_table) => {
                let mut join = ExtraJoin::new(
                    &join_table.referenced_by,
                    &join_table.foreign_by,
                    &join_table.foreign_key,
                    &spec.mapped_by,
                    key,
                )?;
                if let Some(order) = &spec.referenced_order {
                    join = join.with_referenced_order(order)?;
                }
                criteria.add_join(join);
            }
            None => {
                criteria.set_where(Some(QueryFilter::eq(&spec.mapped_by, key)))?;
            }
        }

        debug_log!(
            "[MANAGER] Resolving {}.{} ({})",
            T::MODEL_NAME,
            name,
            spec.kind
        );

        if spec.kind == RelationshipKind::ToOne {
            return Ok(Related::One(self.find_one::<R>(criteria).await?));
        }
        if page_size > 0 {
            return Ok(Related::Paged(self.find_paginated::<R>(criteria, page_size)?));
        }
        if self.buffer_results {
            Ok(Related::Many(self.find_all::<R>(criteria).await?))
        } else {
            Ok(Related::Unbuffered(self.find_all_unbuffered::<R>(criteria).await?))
        }
    }

    async fn unresolved_relationship<R: Model>(
        &self,
        kind: RelationshipKind,
        page_size: u64,
    ) -> Result<Related<'_, R>> {
        if kind == RelationshipKind::ToOne {
            return Ok(Related::One(None));
        }
        if page_size > 0 {
            let criteria = Criteria::for_model::<R>()?;
            return Ok(Related::Paged(PaginatedResultSet::empty(self, criteria, page_size)?));
        }

        let context = self.hydration_context(self.metadata::<R>().await?);
        if self.buffer_results {
            Ok(Related::Many(HydratingResultSet::new(BufferedRows::new(Vec::new()), context)))
        } else {
            Ok(Related::Unbuffered(UnbufferedHydratingResultSet::new(
                Box::new(BufferedRows::new(Vec::new())),
                context,
            )))
        }
    }

    async fn queue<T: Model>(&self, object: &Arc<Mutex<T>>, mode: WriteMode) -> Result<bool> {
        let metadata = self.metadata::<T>().await?;
        let entity: SharedEntity = object.clone();
        let mut pending = self.pending.lock().await;
        PersistenceCoordinator::new(self.executor.as_ref(), &self.signals).persist(
            &mut pending,
            entity,
            metadata,
            mode,
        )
    }

    async fn metadata_for<T: Model>(&self, criteria: &Criteria) -> Result<Arc<ModelMetadata>> {
        if criteria.model() != T::MODEL_NAME {
            return Err(ModelError::InvalidCriteria(format!(
                "criteria for {} used to query {}",
                criteria.model(),
                T::MODEL_NAME
            )));
        }
        self.metadata::<T>().await
    }

    async fn select<T: Model>(
        &self,
        mut criteria: Criteria,
    ) -> Result<(Box<dyn RowIterator>, HydrationContext)> {
        let metadata = self.metadata_for::<T>(&criteria).await?;
        let spec = QueryBuilder::new(metadata.relational()?).build_query(&mut criteria)?;
        let rows = self.executor.execute(&SqlGenerator::select(&spec)).await?;

        Ok((rows, self.hydration_context(metadata)))
    }

    fn hydration_context(&self, metadata: Arc<ModelMetadata>) -> HydrationContext {
        HydrationContext {
            metadata,
            signals: self.signals.clone(),
            casts: self.casts.clone(),
        }
    }
}

impl std::fmt::Debug for ModelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelManager")
            .field("models", &self.registry.len())
            .field("default_page_size", &self.default_page_size)
            .field("buffer_results", &self.buffer_results)
            .finish()
    }
}
