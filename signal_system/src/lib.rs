//! Signal system for model lifecycle hooks
//!
//! This crate provides the ordered, typed hook pipeline used by the modelhaus
//! mapping layer: lifecycle events whose listeners may halt propagation, and
//! cast stages that may claim a value during hydration.

#[cfg(feature = "debug-logging")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

pub mod cast;
pub mod event;
pub mod manager;
pub mod prelude;
pub mod types;

pub use cast::{CastOutcome, CastPipeline, CastRequest};
pub use event::{EventType, ModelEvent};
pub use manager::SignalManager;
pub use types::{CastStage, EventCallback, HookOutcome, PostgresValue};
