//! Per-invocation context threaded through a compiled graph run.

use std::collections::HashSet;

use tokio::sync::mpsc;

use crate::memory::RunnableConfig;
use crate::stream::{MessageChunk, StreamEvent, StreamMode};

/// Context available to nodes during a single `invoke_with_context` run.
///
/// Carries the thread/user identifiers from [`RunnableConfig`] plus an optional
/// stream sender nodes can use to emit [`StreamEvent`]s as they work, gated by
/// which [`StreamMode`]s the caller asked for.
#[derive(Clone)]
pub struct RunContext<S> {
    pub config: RunnableConfig,
    stream_tx: Option<mpsc::Sender<StreamEvent<S>>>,
    modes: HashSet<StreamMode>,
}

impl<S> RunContext<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(config: RunnableConfig) -> Self {
        Self {
            config,
            stream_tx: None,
            modes: HashSet::new(),
        }
    }

    pub fn with_stream(
        config: RunnableConfig,
        stream_tx: mpsc::Sender<StreamEvent<S>>,
        modes: HashSet<StreamMode>,
    ) -> Self {
        Self {
            config,
            stream_tx: Some(stream_tx),
            modes,
        }
    }

    pub fn is_mode_enabled(&self, mode: StreamMode) -> bool {
        self.modes.contains(&mode)
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.config.thread_id.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.config.user_id.as_deref()
    }

    /// Sends an event if streaming is enabled and the mode is active. Best-effort:
    /// a full or closed channel silently drops the event rather than failing the run.
    pub async fn emit(&self, mode: StreamMode, event: StreamEvent<S>) {
        if !self.is_mode_enabled(mode) {
            return;
        }
        if let Some(tx) = &self.stream_tx {
            let _ = tx.send(event).await;
        }
    }

    pub fn stream_sender(&self) -> Option<mpsc::Sender<StreamEvent<S>>> {
        self.stream_tx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> StreamEvent<i32> {
        StreamEvent::Messages(MessageChunk { content: content.into() })
    }

    #[tokio::test]
    async fn emit_is_noop_without_stream_sender() {
        let ctx: RunContext<i32> = RunContext::new(RunnableConfig::default());
        ctx.emit(StreamMode::Messages, chunk("hi")).await;
    }

    #[tokio::test]
    async fn emit_sends_when_mode_enabled() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut modes = HashSet::new();
        modes.insert(StreamMode::Messages);
        let ctx = RunContext::with_stream(RunnableConfig::default(), tx, modes);
        ctx.emit(StreamMode::Messages, chunk("hi")).await;
        match rx.recv().await {
            Some(StreamEvent::Messages(c)) => assert_eq!(c.content, "hi"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn emit_skips_disabled_mode() {
        let (tx, mut rx) = mpsc::channel(4);
        let ctx = RunContext::with_stream(RunnableConfig::default(), tx, HashSet::new());
        ctx.emit(StreamMode::Messages, chunk("hi")).await;
        assert!(rx.try_recv().is_err());
    }
}
