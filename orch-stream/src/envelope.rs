//! Per-turn sequencing: attaches a session id and a monotonic event id to
//! every SSE frame so a client (or replay) can detect gaps or reordering.

use crate::event::SseEvent;
use serde_json::Value;

/// Sequencing state for one user turn: which session this is, and the next
/// event id to stamp.
pub struct EnvelopeState {
    pub session_id: String,
    pub next_event_id: u64,
}

impl EnvelopeState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            next_event_id: 1,
        }
    }

    /// Serializes `event` to a frame value and stamps `session_id`/`event_id`
    /// onto it, advancing the sequence counter.
    pub fn to_json(&mut self, event: &SseEvent) -> Result<Value, serde_json::Error> {
        let mut frame = event.to_frame_value()?;
        if let Some(obj) = frame.as_object_mut() {
            obj.insert("session_id".to_string(), Value::String(self.session_id.clone()));
            obj.insert("event_id".to_string(), Value::Number(self.next_event_id.into()));
        }
        self.next_event_id += 1;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamps_session_id_and_increments_event_id() {
        let mut state = EnvelopeState::new("sess-1");
        let first = state.to_json(&SseEvent::Message { content: "a".into() }).unwrap();
        let second = state.to_json(&SseEvent::Message { content: "b".into() }).unwrap();
        assert_eq!(first["session_id"], "sess-1");
        assert_eq!(first["event_id"], 1);
        assert_eq!(second["event_id"], 2);
    }
}
