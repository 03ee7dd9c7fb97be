//! Type definitions for signal system
//!
//! This module contains the callback signatures and hook outcomes
//! shared by events and cast stages.

use crate::cast::{CastOutcome, CastRequest};
use crate::event::ModelEvent;

// Re-export from type-mapping for convenience
pub use type_mapping::PostgresValue;

/// Result of a lifecycle listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Continue with the next listener
    Pass,
    /// Stop propagation; the reason is surfaced to the caller
    Halt(String),
}

impl HookOutcome {
    pub fn halt(reason: impl Into<String>) -> Self {
        HookOutcome::Halt(reason.into())
    }

    pub fn is_halted(&self) -> bool {
        matches!(self, HookOutcome::Halt(_))
    }
}

/// Lifecycle listener; may rewrite the event payload in place
pub type EventCallback =
    Box<dyn Fn(&mut ModelEvent) -> anyhow::Result<HookOutcome> + Send + Sync>;

/// Cast stage; the first stage to claim a value wins
pub type CastStage =
    Box<dyn Fn(&CastRequest<'_>) -> anyhow::Result<CastOutcome> + Send + Sync>;
