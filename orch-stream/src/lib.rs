//! SSE event protocol for the orchestration engine's `/chat` endpoint: the
//! `thinking`/`tool_call`/`tool_result`/`message`/`error`/`done` event set
//! (C5) and per-turn sequencing. Does not depend on `orch-core`; `orch-serve`
//! bridges `orch-core::StreamEvent` into [`SseEvent`] and calls
//! [`EnvelopeState::to_json`].

pub mod envelope;
pub mod event;

pub use envelope::EnvelopeState;
pub use event::{
    tool_call_display_title, tool_call_group, SseEvent, ThinkingStatus, ToolCallGroup,
    ToolCallStatus,
};
