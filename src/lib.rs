//! # ModelHaus
//!
//! An annotation-driven object-relational mapping layer for PostgreSQL: models
//! spread over several tables, lifecycle hooks, change tracking, and paginated
//! relationships.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modelhaus::prelude::*;
//!
//! #[derive(Debug, Clone, Default, Model)]
//! #[target("moduledev_user")]
//! pub struct User {
//!     #[field(integer)]
//!     pub id: Option<i64>,
//!
//!     #[field(string)]
//!     pub forename: String,
//!
//!     #[field(string)]
//!     pub email: String,
//!
//!     #[unmapped]
//!     pub unmapped: UnmappedProperties,
//!
//!     #[change_tracking]
//!     pub tracker: ChangeTracker,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let modelhaus = ModelHaus::from_config(&config).await?;
//!     let manager = modelhaus.manager();
//!
//!     let criteria = Criteria::for_model::<User>()?
//!         .with_where(QueryFilter::eq("email", "ada@example.com"))?;
//!     if let Some(user) = manager.find_one::<User>(criteria).await? {
//!         println!("Found user: {}", user.forename);
//!     }
//!
//!     let user = std::sync::Arc::new(tokio::sync::Mutex::new(User {
//!         forename: "Grace".to_string(),
//!         email: "grace@example.com".to_string(),
//!         ..User::default()
//!     }));
//!     manager.persist(&user).await?;
//!     manager.write().await?;
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use core::ModelHaus;
pub use errors::ModelHausError;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, MappingConfig};

// Re-export internal crates used by macros and public API
// These MUST be public for the generated macro code to work correctly
pub use store_object;
pub use table_derive;
pub use signal_system;
pub use type_mapping;

// Re-export external dependencies used in public API
pub use sqlx;
pub use async_trait;
