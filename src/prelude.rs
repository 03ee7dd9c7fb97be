//! Convenience re-exports for common ModelHaus usage
//!
//! This prelude module re-exports the most commonly used items from the ModelHaus ecosystem,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use modelhaus::prelude::*;
//!
//! // Now you have access to all the common ModelHaus types and traits
//! ```

// Core ModelHaus components
pub use crate::core::ModelHaus;
pub use crate::errors::ModelHausError;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, MappingConfig};

// Re-export commonly used store-object types for convenience
pub use store_object::prelude::*;

// Re-export store_object module for macro-generated code
pub use store_object;

// Re-export signal system for lifecycle hooks and casts
pub use signal_system::prelude::*;

// Re-export the model derive
pub use table_derive::Model;

// Common external dependencies
pub use anyhow;
pub use async_trait;
pub use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
pub use sqlx;
pub use tokio;
pub use uuid::Uuid;
