use crate::event::{EventType, ModelEvent};
use crate::types::{EventCallback, HookOutcome};

/// Ordered lifecycle hook pipeline
///
/// Listeners run in registration order. The first listener returning
/// [`HookOutcome::Halt`] stops propagation for that event.
pub struct SignalManager {
    callbacks: std::sync::RwLock<Vec<(EventType, EventCallback)>>,
}

impl std::fmt::Debug for SignalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalManager")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

impl SignalManager {
    pub fn new() -> Self {
        Self {
            callbacks: std::sync::RwLock::new(Vec::new()),
        }
    }

    /// Add a listener for one event type
    pub fn add_callback<F>(&self, event_type: EventType, callback: F)
    where
        F: Fn(&mut ModelEvent) -> anyhow::Result<HookOutcome> + Send + Sync + 'static,
    {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.push((event_type, Box::new(callback)));
        }
    }

    /// Emit an event to its listeners, stopping at the first halt
    pub fn emit(&self, event: &mut ModelEvent) -> anyhow::Result<HookOutcome> {
        let callbacks = match self.callbacks.read() {
            Ok(callbacks) => callbacks,
            Err(_) => return Ok(HookOutcome::Pass),
        };

        for (event_type, callback) in callbacks.iter() {
            if *event_type != event.event_type {
                continue;
            }

            let outcome = callback(event)?;
            if let HookOutcome::Halt(reason) = &outcome {
                debug_log!(
                    "[SIGNAL] {} halted for {}: {}",
                    event.event_type.name(),
                    event.model,
                    reason
                );
                return Ok(outcome);
            }
        }

        Ok(HookOutcome::Pass)
    }

    /// Clear all callbacks
    pub fn clear_callbacks(&self) {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.clear();
        }
    }

    /// Get number of registered callbacks
    pub fn callback_count(&self) -> usize {
        self.callbacks.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for SignalManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PostgresValue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_listeners_only_see_their_event_type() {
        let manager = SignalManager::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let counter = seen.clone();
        manager.add_callback(EventType::PreWrite, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(HookOutcome::Pass)
        });

        let mut pre_write = ModelEvent::new(EventType::PreWrite, "User");
        let mut post_write = ModelEvent::new(EventType::PostWrite, "User");
        manager.emit(&mut pre_write).unwrap();
        manager.emit(&mut post_write).unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_halt_stops_propagation() {
        let manager = SignalManager::new();
        let later = Arc::new(AtomicUsize::new(0));

        manager.add_callback(EventType::PrePersist, |_| Ok(HookOutcome::halt("readonly")));
        let counter = later.clone();
        manager.add_callback(EventType::PrePersist, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(HookOutcome::Pass)
        });

        let mut event = ModelEvent::new(EventType::PrePersist, "User");
        let outcome = manager.emit(&mut event).unwrap();

        assert_eq!(outcome, HookOutcome::Halt("readonly".to_string()));
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listeners_can_rewrite_data() {
        let manager = SignalManager::new();
        manager.add_callback(EventType::PreHydrate, |event| {
            event
                .data
                .push(("injected".to_string(), PostgresValue::from(true)));
            Ok(HookOutcome::Pass)
        });

        let mut event = ModelEvent::new(EventType::PreHydrate, "User");
        manager.emit(&mut event).unwrap();
        assert_eq!(event.data_value("injected"), Some(&PostgresValue::Boolean(true)));
    }

    #[test]
    fn test_listener_errors_propagate() {
        let manager = SignalManager::new();
        manager.add_callback(EventType::PostWrite, |_| Err(anyhow::anyhow!("boom")));

        let mut event = ModelEvent::new(EventType::PostWrite, "User");
        assert!(manager.emit(&mut event).is_err());
    }

    #[test]
    fn test_clear_callbacks() {
        let manager = SignalManager::new();
        manager.add_callback(EventType::Hydrate, |_| Ok(HookOutcome::Pass));
        assert_eq!(manager.callback_count(), 1);
        manager.clear_callbacks();
        assert_eq!(manager.callback_count(), 0);
    }
}
