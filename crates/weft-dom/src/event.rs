//! Lifecycle and custom event dispatch.
//!
//! Every dispatched event merges the crate version into its payload so
//! listeners can handle payload differences from version to version, and is
//! configured to bubble and cross shadow boundaries.

use std::sync::Mutex;

use serde_json::{json, Value};

use crate::live::NodeId;

/// Version merged into every event payload.
pub const EVENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Scope all framework event names.
pub fn event_name(label: &str) -> String {
    format!("@weft/{label}")
}

/// A dispatched event.
#[derive(Debug, Clone)]
pub struct DomEvent {
    /// Scoped event name.
    pub name: String,
    /// Node the event was dispatched on.
    pub target: NodeId,
    /// Payload with the `version` field merged in.
    pub detail: Value,
    /// Events bubble to ancestor listeners.
    pub bubbles: bool,
    /// Events cross shadow boundaries.
    pub composed: bool,
}

impl DomEvent {
    /// Create an event, merging `version` into the payload.
    pub fn new(label: &str, target: NodeId, payload: Value) -> Self {
        let mut detail = match payload {
            Value::Object(map) => Value::Object(map),
            Value::Null => json!({}),
            other => json!({ "value": other }),
        };
        if let Value::Object(map) = &mut detail {
            map.insert("version".to_string(), Value::String(EVENT_VERSION.to_string()));
        }

        Self {
            name: event_name(label),
            target,
            detail,
            bubbles: true,
            composed: true,
        }
    }
}

/// Receiver for dispatched events.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn dispatch(&self, event: DomEvent);
}

/// Sink that records every event, for hosts and tests that inspect them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DomEvent>>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<DomEvent> {
        self.events.lock().expect("event sink poisoned").clone()
    }

    /// Names of all recorded events, in dispatch order.
    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.name).collect()
    }

    /// Drop all recorded events.
    pub fn clear(&self) {
        self.events.lock().expect("event sink poisoned").clear();
    }
}

impl EventSink for RecordingSink {
    fn dispatch(&self, event: DomEvent) {
        self.events.lock().expect("event sink poisoned").push(event);
    }
}

/// Sink that traces events without retaining them.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn dispatch(&self, event: DomEvent) {
        tracing::trace!(name = %event.name, target = %event.target, "event dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_carries_version_and_crossing_flags() {
        let event = DomEvent::new("create", NodeId::next(), json!({ "answer": 42 }));

        assert_eq!(event.name, "@weft/create");
        assert!(event.bubbles);
        assert!(event.composed);
        assert_eq!(event.detail["answer"], 42);
        assert_eq!(event.detail["version"], EVENT_VERSION);
    }

    #[test]
    fn test_null_payload_becomes_versioned_object() {
        let event = DomEvent::new("destroy", NodeId::next(), Value::Null);

        assert_eq!(event.detail["version"], EVENT_VERSION);
    }

    #[test]
    fn test_recording_sink_orders_events() {
        let sink = RecordingSink::new();
        sink.dispatch(DomEvent::new("create", NodeId::next(), Value::Null));
        sink.dispatch(DomEvent::new("destroy", NodeId::next(), Value::Null));

        assert_eq!(sink.names(), vec!["@weft/create", "@weft/destroy"]);
        sink.clear();
        assert!(sink.events().is_empty());
    }
}
