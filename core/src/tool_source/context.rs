//! Context passed into a built-in tool's `call` for the current invocation.
//!
//! Built by the tool executor (C3) immediately before dispatch, carrying the
//! session/user identifiers from `RunnableConfig` so a tool can scope
//! per-session state without threading those ids through every call signature.
//!
//! ```rust,ignore
//! use orchestra_core::tool_source::ToolCallContext;
//! use serde_json::json;
//!
//! async fn my_tool(ctx: Option<&ToolCallContext>) -> String {
//!     if let Some(ctx) = ctx {
//!         if let Some(writer) = &ctx.stream_writer {
//!             writer.emit_custom(json!({"status": "starting"}));
//!         }
//!     }
//!     // Do work...
//!     "Result".to_string()
//! }
//! ```

use crate::message::Message;
use crate::stream::ToolStreamWriter;

/// Per-call context available to a [`BuiltinTool`](crate::tools::BuiltinTool)
/// during execution.
///
/// # Fields
///
/// - `recent_messages`: currently unused by any built-in tool; reserved for
///   tools that need the conversation so far.
/// - `stream_writer`: optional writer for emitting custom streaming events.
/// - `thread_id`: the session id, always set by [`crate::executor::ToolExecutor`].
/// - `user_id`: the calling user's id, when known.
#[derive(Debug, Clone, Default)]
pub struct ToolCallContext {
    /// Recent messages in the current conversation (current step's state.messages).
    pub recent_messages: Vec<Message>,

    /// Optional writer for emitting custom streaming events.
    ///
    /// This is provided by [`crate::executor::ToolExecutor`] when streaming is enabled with `StreamMode::Custom`.
    /// Tools can use this to emit progress updates, intermediate results, or any
    /// custom JSON data during execution.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// if let Some(writer) = &ctx.stream_writer {
    ///     writer.emit_custom(serde_json::json!({"progress": 50}));
    /// }
    /// ```
    pub stream_writer: Option<ToolStreamWriter>,

    /// Optional thread/session id for the current run.
    ///
    /// Injected by `ToolExecutor` from the run's session id.
    /// When set, tools can use it as a session key (e.g. per-thread todo storage).
    pub thread_id: Option<String>,

    /// Optional user id for the current run.
    ///
    /// Injected by `ToolExecutor` from the run's user id.
    /// Use for multi-tenant or store namespace. See RunnableConfig::user_id.
    pub user_id: Option<String>,
}

impl ToolCallContext {
    /// Creates a new ToolCallContext with the given messages.
    ///
    /// `stream_writer`, `thread_id`, and `user_id` are set to `None`.
    pub fn new(recent_messages: Vec<Message>) -> Self {
        Self {
            recent_messages,
            stream_writer: None,
            thread_id: None,
            user_id: None,
        }
    }

    /// Creates a new ToolCallContext with messages and a stream writer.
    ///
    /// `thread_id` and `user_id` are set to `None`. `ToolExecutor` builds the
    /// context with thread_id/user_id from the run's session instead.
    pub fn with_stream_writer(
        recent_messages: Vec<Message>,
        stream_writer: ToolStreamWriter,
    ) -> Self {
        Self {
            recent_messages,
            stream_writer: Some(stream_writer),
            thread_id: None,
            user_id: None,
        }
    }

    /// Emits a custom streaming event if a writer is available.
    ///
    /// This is a convenience method that checks if `stream_writer` is present
    /// and calls `emit_custom` on it. Returns `true` if the event was sent,
    /// `false` if no writer is available or sending failed.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let sent = ctx.emit_custom(serde_json::json!({"status": "processing"}));
    /// ```
    pub fn emit_custom(&self, value: serde_json::Value) -> bool {
        self.stream_writer
            .as_ref()
            .map(|w| w.emit_custom(value))
            .unwrap_or(false)
    }
}
