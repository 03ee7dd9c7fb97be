//! Convenience re-exports for common signal-system usage

// Core signal system components
pub use crate::cast::{CastOutcome, CastPipeline, CastRequest};
pub use crate::event::{EventType, ModelEvent};
pub use crate::manager::SignalManager;
pub use crate::types::{CastStage, EventCallback, HookOutcome, PostgresValue};

// Common external dependencies
pub use anyhow;
pub use serde::{Deserialize, Serialize};
pub use serde_json;
