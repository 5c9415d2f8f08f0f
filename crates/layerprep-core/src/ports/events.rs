use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Port for structured pipeline events.
///
/// Components receive a recorder instead of writing to a shared log file.
pub trait EventRecorder: Send + Sync {
    /// Record a named event with key/value fields
    fn record(&self, event: &str, fields: &[(&str, String)]);
}

/// Recorder that forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRecorder;

impl EventRecorder for TracingRecorder {
    fn record(&self, event: &str, fields: &[(&str, String)]) {
        let rendered: Vec<String> = fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        tracing::info!(event, fields = %rendered.join(" "), "pipeline event");
    }
}

/// Recorder that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRecorder;

impl EventRecorder for NoopRecorder {
    fn record(&self, _event: &str, _fields: &[(&str, String)]) {}
}

/// A recorded event
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub event: String,
    pub fields: Vec<(String, String)>,
    pub at: DateTime<Utc>,
}

impl RecordedEvent {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// Recorder that keeps events in memory, for audit trails and tests
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    events: Mutex<Vec<RecordedEvent>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Names of recorded events in order
    pub fn event_names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event).collect()
    }

    pub fn find(&self, event: &str) -> Option<RecordedEvent> {
        self.events().into_iter().find(|e| e.event == event)
    }
}

impl EventRecorder for MemoryRecorder {
    fn record(&self, event: &str, fields: &[(&str, String)]) {
        if let Ok(mut events) = self.events.lock() {
            events.push(RecordedEvent {
                event: event.to_string(),
                fields: fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                at: Utc::now(),
            });
        }
    }
}
