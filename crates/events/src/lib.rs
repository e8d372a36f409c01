//! Shared event contracts for the clipboard queue.
//!
//! The queue panel renders from these payloads, so field names here are the
//! wire contract between the core and whatever displays it.

mod bus;

pub use bus::{EmittedEvent, EventBus, EventBusRef, InMemoryEventBus, LogEventBus, NullEventBus};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the queue as the panel shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItemView {
    pub id: Uuid,
    /// Text preview, absent for content with no textual form (images).
    #[serde(default)]
    pub preview: Option<String>,
    /// Dimmed in the panel once pasted.
    pub consumed: bool,
}

/// Published after every queue mutation.
///
/// Producers: queue (shared handle)
/// Consumers: queue panel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueChangedEvent {
    pub items: Vec<QueueItemView>,
}

/// Published when queue mode turns on or off.
///
/// Producers: application (session)
/// Consumers: queue panel, menu bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueModeChangedEvent {
    pub active: bool,
    /// Whether the keystroke hook is actually installed. Can be false while
    /// `active` is true when permission is missing.
    pub intercepting: bool,
}

/// Published when a paste gesture found nothing left to paste.
///
/// Producers: input (interception manager)
/// Consumers: queue panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueExhaustedEvent {
    pub item_count: usize,
}

/// Event names as constants to prevent typos.
pub mod event_names {
    /// Queue contents or consumed flags changed.
    pub const QUEUE_CHANGED: &str = "queue:changed";
    /// Queue mode toggled.
    pub const QUEUE_MODE_CHANGED: &str = "queue:mode_changed";
    /// Paste gesture hit an exhausted queue.
    pub const QUEUE_EXHAUSTED: &str = "queue:exhausted";
}

/// Serialize `event` and publish it, logging instead of failing on error.
pub fn publish<T: Serialize>(bus: &dyn EventBus, topic: &str, event: &T) {
    match serde_json::to_value(event) {
        Ok(payload) => bus.emit(topic, payload),
        Err(e) => tracing::warn!(topic, error = %e, "failed to serialize event"),
    }
}
