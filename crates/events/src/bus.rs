//! Fan-out of informational events.
//!
//! The coordinator forwards informational events (name clicks) to whoever
//! is listening, usually the settings surface. Having nobody listening is
//! normal, so emitting reports it as an error the caller is free to drop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventBusError {
    #[error("no subscriber for {0}")]
    NoSubscribers(String),
}

/// Where the coordinator publishes informational events.
pub trait EventBus: Send + Sync {
    /// Publish `payload` on `topic` (see [`crate::event_names`]).
    /// `Err` means nobody received it.
    fn emit(&self, topic: &str, payload: serde_json::Value) -> Result<(), EventBusError>;
}

pub type EventBusRef = Arc<dyn EventBus>;

/// A recorded or broadcast event.
#[derive(Debug, Clone)]
pub struct EmittedEvent {
    pub topic: String,
    pub payload: serde_json::Value,
}

impl EmittedEvent {
    fn new(topic: &str, payload: serde_json::Value) -> Self {
        Self {
            topic: topic.to_string(),
            payload,
        }
    }
}

/// Records every emitted event; used by tests and as a name log that
/// outlives its readers.
#[derive(Default)]
pub struct InMemoryEventBus {
    recorded: Mutex<Vec<EmittedEvent>>,
}

impl InMemoryEventBus {
    /// An empty recording bus.
    pub fn new() -> Self {
        Self::default()
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<EmittedEvent>> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every event emitted so far, in order.
    pub fn events(&self) -> Vec<EmittedEvent> {
        self.recorded().clone()
    }

    /// Recorded events on one topic, oldest first.
    pub fn events_for(&self, topic: &str) -> Vec<EmittedEvent> {
        self.recorded()
            .iter()
            .filter(|event| event.topic == topic)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.recorded().len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded().is_empty()
    }
}

impl EventBus for InMemoryEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) -> Result<(), EventBusError> {
        self.recorded().push(EmittedEvent::new(topic, payload));
        Ok(())
    }
}

/// Event bus that never has a listener.
pub struct NullEventBus;

impl EventBus for NullEventBus {
    fn emit(&self, topic: &str, _payload: serde_json::Value) -> Result<(), EventBusError> {
        Err(EventBusError::NoSubscribers(topic.to_string()))
    }
}

/// Fan-out bus backed by a tokio broadcast channel.
///
/// Observers come and go by subscribing and dropping their receiver.
pub struct BroadcastEventBus {
    tx: broadcast::Sender<EmittedEvent>,
}

impl BroadcastEventBus {
    /// Broadcast bus keeping up to `capacity` events for slow subscribers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Receive events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EmittedEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventBus for BroadcastEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) -> Result<(), EventBusError> {
        self.tx
            .send(EmittedEvent::new(topic, payload))
            .map(|_| ())
            .map_err(|_| EventBusError::NoSubscribers(topic.to_string()))
    }
}
