//! Dialogue event log port.
//!
//! Hosts that want a persistent record of turns and moves implement this
//! sink; the pipeline emits events through it. The default is a no-op.

use serde_json::Value;

/// One loggable dialogue event.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueEvent {
    pub event_type: String,
    pub payload: Value,
}

impl DialogueEvent {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}

/// Sink for dialogue events. Logging must never fail the turn; sinks
/// swallow their own errors.
pub trait DialogueEventLog: Send + Sync {
    fn log(&self, event: DialogueEvent);
}

/// Default sink that drops all events.
pub struct NoDialogueEventLog;

impl DialogueEventLog for NoDialogueEventLog {
    fn log(&self, _event: DialogueEvent) {}
}
