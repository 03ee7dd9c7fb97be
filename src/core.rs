//! Core ModelHaus functionality
//!
//! This module contains the main ModelHaus struct: it owns the PostgreSQL
//! pool and builds model managers wired to the live schema.

use sqlx::PgPool;
use std::time::Duration;

use config::{AppConfig, DatabaseConfig, MappingConfig};
use signal_system::{CastPipeline, SignalManager};
use store_object::{ModelManager, PgExecutor, PgSchemaCatalog};

use crate::errors::ModelHausError;

/// Main ModelHaus coordinator that manages the database connection
pub struct ModelHaus {
    pool: PgPool,
    mapping: MappingConfig,
}

impl ModelHaus {
    /// Create new ModelHaus with database connection
    pub async fn new(config: DatabaseConfig, mapping: MappingConfig) -> Result<Self, ModelHausError> {
        let connection_string = config.connection_string();

        let mut pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

        // Set max lifetime if specified
        if config.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
        }

        let pool = pool_options.connect(&connection_string).await?;

        debug_log!(
            "[MODELHAUS] Connected to {}:{}/{} (schema {})",
            config.host,
            config.port,
            config.database,
            mapping.schema
        );

        Ok(Self { pool, mapping })
    }

    /// Create ModelHaus from a loaded application configuration
    pub async fn from_config(config: &AppConfig) -> Result<Self, ModelHausError> {
        Self::new(config.database.clone(), config.mapping.clone()).await
    }

    /// Wrap an existing pool
    pub fn with_pool(pool: PgPool, mapping: MappingConfig) -> Self {
        Self { pool, mapping }
    }

    /// Get database pool reference
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn mapping(&self) -> &MappingConfig {
        &self.mapping
    }

    /// A model manager over the configured schema, without listeners
    pub fn manager(&self) -> ModelManager {
        self.manager_with(SignalManager::new(), CastPipeline::new())
    }

    /// A model manager emitting to `signals` and casting through `casts`
    pub fn manager_with(&self, signals: SignalManager, casts: CastPipeline) -> ModelManager {
        let catalog = PgSchemaCatalog::new(self.pool.clone(), self.mapping.schema.clone());
        let executor = PgExecutor::new(self.pool.clone());

        ModelManager::new(std::sync::Arc::new(catalog), std::sync::Arc::new(executor))
            .with_signals(signals)
            .with_casts(casts)
            .with_default_page_size(self.mapping.default_page_size)
            .with_buffered_results(self.mapping.buffer_results)
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), ModelHausError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
