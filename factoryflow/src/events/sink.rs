//! Event sink trait and implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, Level};

use crate::core::StageId;

/// Receives workflow lifecycle events when monitoring is enabled.
///
/// Payloads always carry `run_id`; stage events also carry `stage`.
/// Implementations must not fail. Errors are swallowed inside the sink.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event.
    ///
    /// # Arguments
    ///
    /// * `event_type` - The type of event (e.g., "stage.retrying")
    /// * `data` - Optional event payload
    async fn emit(&self, event_type: &str, data: Option<Value>);
}

/// Discards every event. Used when monitoring is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<Value>) {}
}

/// Logs each event through `tracing`, lifting `run_id` and `stage` out of
/// the payload into structured fields.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a logging sink at `level`. Anything other than `DEBUG` logs at `INFO`.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub const fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

fn payload_str<'a>(data: Option<&'a Value>, key: &str) -> &'a str {
    data.and_then(|d| d.get(key))
        .and_then(Value::as_str)
        .unwrap_or("-")
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        let run_id = payload_str(data.as_ref(), "run_id");
        let stage = payload_str(data.as_ref(), "stage");
        if self.level == Level::DEBUG {
            debug!(event_type, run_id, stage, event_data = ?data, "monitoring event");
        } else {
            info!(event_type, run_id, stage, event_data = ?data, "monitoring event");
        }
    }
}

/// One event captured by [`CollectingEventSink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedEvent {
    /// Event type, e.g. `stage.completed`.
    pub event_type: String,
    /// Payload as emitted.
    pub data: Option<Value>,
    /// When the sink received the event.
    pub received_at: DateTime<Utc>,
}

impl RecordedEvent {
    /// The `stage` named in the payload, if any.
    pub fn stage(&self) -> Option<StageId> {
        self.data
            .as_ref()
            .and_then(|d| d.get("stage"))
            .and_then(|stage| serde_json::from_value(stage.clone()).ok())
    }

    /// The `run_id` named in the payload, if any.
    pub fn run_id(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.get("run_id"))
            .and_then(Value::as_str)
    }
}

/// Keeps every event in memory. Used by tests and embedders that want to
/// inspect a run after the fact.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Number of events received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// True if nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Event types in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|event| event.event_type.clone())
            .collect()
    }

    /// Events whose type starts with `type_prefix`.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.event_type.starts_with(type_prefix))
            .cloned()
            .collect()
    }

    /// Stages named by events of `event_type`, in emission order.
    #[must_use]
    pub fn stages_for(&self, event_type: &str) -> Vec<StageId> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.event_type == event_type)
            .filter_map(RecordedEvent::stage)
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.events.lock().push(RecordedEvent {
            event_type: event_type.to_string(),
            data,
            received_at: Utc::now(),
        });
    }
}
