//! Model lifecycle event types and definitions
//!
//! This module defines the events emitted around metadata preparation,
//! hydration, persistence and writes, in the order they fire.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::PostgresValue;

/// Lifecycle event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    PrepareModelMetadata,
    PrepareFieldMetadata,
    PreHydrate,
    Hydrate,
    PostHydrate,
    PrePersist,
    PostPersist,
    PreWrite,
    PostWrite,
}

impl EventType {
    /// Canonical event name
    pub fn name(&self) -> &'static str {
        match self {
            EventType::PrepareModelMetadata => "prepareModelMetadata",
            EventType::PrepareFieldMetadata => "prepareFieldMetadata",
            EventType::PreHydrate => "preHydrate",
            EventType::Hydrate => "hydrate",
            EventType::PostHydrate => "postHydrate",
            EventType::PrePersist => "prePersist",
            EventType::PostPersist => "postPersist",
            EventType::PreWrite => "preWrite",
            EventType::PostWrite => "postWrite",
        }
    }
}

/// Lifecycle event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEvent {
    /// Event type
    pub event_type: EventType,
    /// Model the event concerns
    pub model: String,
    /// Table name, for table-scoped events
    pub table_name: Option<String>,
    /// Named parameters (metadata, property, annotation, pending count...)
    pub payload: HashMap<String, PostgresValue>,
    /// Ordered row-shaped data: the raw row on preHydrate, field values afterwards
    pub data: Vec<(String, PostgresValue)>,
    /// Event timestamp (UTC)
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ModelEvent {
    pub fn new(event_type: EventType, model: impl Into<String>) -> Self {
        Self {
            event_type,
            model: model.into(),
            table_name: None,
            payload: HashMap::new(),
            data: Vec::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<PostgresValue>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn with_data(mut self, data: Vec<(String, PostgresValue)>) -> Self {
        self.data = data;
        self
    }

    pub fn add_payload(&mut self, key: impl Into<String>, value: impl Into<PostgresValue>) {
        self.payload.insert(key.into(), value.into());
    }

    pub fn payload_value(&self, key: &str) -> Option<&PostgresValue> {
        self.payload.get(key)
    }

    /// First value under `key` in the row-shaped data
    pub fn data_value(&self, key: &str) -> Option<&PostgresValue> {
        self.data
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Reuse this event's payload for the next stage of the same lifecycle
    pub fn advance(mut self, event_type: EventType) -> Self {
        self.event_type = event_type;
        self.timestamp = chrono::Utc::now();
        self
    }
}
