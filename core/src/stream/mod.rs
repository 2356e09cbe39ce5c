//! Streaming event types emitted while a graph runs.
//!
//! [`StreamEvent`] is the internal, generic-over-state event type produced by
//! [`crate::graph::CompiledStateGraph`] and by LLM streaming inside `ThinkNode`
//! (see [`crate::agent`]). `orch-serve` merges these with provider tool-call deltas
//! and projects them into the wire-level SSE events defined in `orch-stream`.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::llm::{LlmUsage, ToolCallDelta};

/// Which kinds of events a caller wants to receive from a streamed run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Full state after each node transition.
    Values,
    /// Just the update returned by each node.
    Updates,
    /// Token-level message chunks from the LLM.
    Messages,
    /// Arbitrary custom events emitted by tools or nodes.
    Custom,
}

/// One token (or token group) of assistant text as it streams in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageChunk {
    pub content: String,
}

/// Metadata attached to a stream event: which node produced it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamMetadata {
    pub node: String,
}

/// A single event produced while running a compiled graph.
#[derive(Clone, Debug)]
pub enum StreamEvent<S> {
    /// Full state snapshot after a node ran.
    Values(S),
    /// The raw update a node returned, before merge into state.
    Updates(S),
    /// An assistant text token.
    Messages(MessageChunk),
    /// A streaming tool-call argument delta from the provider.
    ToolCallChunk(ToolCallDelta),
    /// Arbitrary JSON emitted by a tool or node.
    Custom(Value),
    /// Token usage for a completed LLM call.
    Usage(LlmUsage),
}

/// Sends [`MessageChunk`]s produced by an LLM call into a [`StreamEvent`] channel,
/// tagging them with the node that's currently running.
#[derive(Clone)]
pub struct ChunkToStreamSender<S> {
    stream_tx: mpsc::Sender<StreamEvent<S>>,
    node_id: String,
}

impl<S> ChunkToStreamSender<S>
where
    S: Send + 'static,
{
    pub fn new(stream_tx: mpsc::Sender<StreamEvent<S>>, node_id: impl Into<String>) -> Self {
        Self {
            stream_tx,
            node_id: node_id.into(),
        }
    }

    /// Builds an `mpsc::channel<MessageChunk>` whose receiver end forwards every
    /// chunk into the wrapped `StreamEvent` channel until the sender is dropped.
    pub fn channel(&self) -> mpsc::Sender<MessageChunk> {
        let (tx, mut rx) = mpsc::channel::<MessageChunk>(32);
        let stream_tx = self.stream_tx.clone();
        tokio::spawn(async move {
            while let Some(chunk) = rx.recv().await {
                if stream_tx.send(StreamEvent::Messages(chunk)).await.is_err() {
                    break;
                }
            }
        });
        tx
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}

/// Type-erased writer tools can use to emit custom streaming events without
/// depending on the graph's state type.
#[derive(Clone)]
pub struct ToolStreamWriter {
    emit: Arc<dyn Fn(Value) -> bool + Send + Sync>,
}

impl ToolStreamWriter {
    pub fn new(emit: impl Fn(Value) -> bool + Send + Sync + 'static) -> Self {
        Self { emit: Arc::new(emit) }
    }

    pub fn noop() -> Self {
        Self::new(|_| false)
    }

    pub fn emit_custom(&self, value: Value) -> bool {
        (self.emit)(value)
    }
}

impl std::fmt::Debug for ToolStreamWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolStreamWriter").finish()
    }
}

impl Default for ToolStreamWriter {
    fn default() -> Self {
        Self::noop()
    }
}

/// Convenience wrapper bundling a sender with which modes are active, so nodes
/// don't need to check `modes` themselves before building events.
pub struct StreamWriter<S> {
    tx: Option<mpsc::Sender<StreamEvent<S>>>,
    modes: std::collections::HashSet<StreamMode>,
}

impl<S> StreamWriter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(tx: mpsc::Sender<StreamEvent<S>>, modes: std::collections::HashSet<StreamMode>) -> Self {
        Self { tx: Some(tx), modes }
    }

    pub fn noop() -> Self {
        Self {
            tx: None,
            modes: std::collections::HashSet::new(),
        }
    }

    pub fn is_mode_enabled(&self, mode: StreamMode) -> bool {
        self.modes.contains(&mode)
    }

    pub async fn emit_message(&self, chunk: MessageChunk) {
        self.try_emit(StreamMode::Messages, StreamEvent::Messages(chunk)).await;
    }

    pub async fn emit_custom(&self, value: Value) {
        self.try_emit(StreamMode::Custom, StreamEvent::Custom(value)).await;
    }

    pub async fn emit_values(&self, state: S) {
        self.try_emit(StreamMode::Values, StreamEvent::Values(state)).await;
    }

    pub async fn emit_updates(&self, state: S) {
        self.try_emit(StreamMode::Updates, StreamEvent::Updates(state)).await;
    }

    /// Usage is always emitted when streaming is active at all; it isn't gated by mode.
    pub async fn emit_usage(&self, usage: LlmUsage) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(StreamEvent::Usage(usage)).await;
        }
    }

    async fn try_emit(&self, mode: StreamMode, event: StreamEvent<S>) {
        if !self.is_mode_enabled(mode) {
            return;
        }
        if let Some(tx) = &self.tx {
            let _ = tx.send(event).await;
        }
    }

    pub fn sender(&self) -> Option<mpsc::Sender<StreamEvent<S>>> {
        self.tx.clone()
    }
}

/// Namespaced metadata for events: reserved for future per-node annotations.
pub type StreamMetadataMap = HashMap<String, String>;
