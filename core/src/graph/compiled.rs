//! Executable graph produced by [`crate::graph::StateGraph::compile`].

use std::collections::HashMap;
use std::fmt::Debug;
use std::pin::Pin;
use std::sync::Arc;

use crate::channels::BoxedStateUpdater;
use crate::error::AgentError;
use crate::graph::conditional::NextEntry;
use crate::graph::node::Node;
use crate::graph::node_middleware::NodeMiddleware;
use crate::graph::next::Next;
use crate::graph::run_context::RunContext;
use crate::graph::state_graph::END;
use crate::memory::{Checkpoint, CheckpointSource, Checkpointer, RunnableConfig};

/// A compiled, executable graph. Immutable: build one with [`crate::graph::StateGraph`].
pub struct CompiledStateGraph<S> {
    pub(crate) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(crate) first_node_id: String,
    pub(crate) edge_order: Vec<String>,
    pub(crate) next_map: HashMap<String, NextEntry<S>>,
    pub(crate) checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    pub(crate) middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    pub(crate) state_updater: BoxedStateUpdater<S>,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Runs the graph to completion starting from `state`, with no run context
    /// (no checkpointing, no streaming).
    pub async fn invoke(&self, state: S) -> Result<S, AgentError> {
        let ctx = RunContext::new(RunnableConfig::default());
        self.invoke_with_context(state, &ctx).await
    }

    /// Runs the graph to completion, persisting a checkpoint after every node
    /// transition when `ctx.config.thread_id` is set and a checkpointer was
    /// attached at compile time.
    pub async fn invoke_with_context(&self, state: S, ctx: &RunContext<S>) -> Result<S, AgentError> {
        let mut current_state = state;
        let mut node_id = self.first_node_id.clone();
        let mut step: i64 = 0;

        self.maybe_checkpoint(&current_state, &node_id, step, CheckpointSource::Input, ctx)
            .await?;

        loop {
            let node = self
                .nodes
                .get(&node_id)
                .ok_or_else(|| AgentError::InvalidState(format!("unknown node '{node_id}'")))?
                .clone();

            let (next_state, next) = self.run_node(node, node_id.clone(), current_state, ctx).await?;
            current_state = next_state;
            step += 1;

            self.maybe_checkpoint(&current_state, &node_id, step, CheckpointSource::Loop, ctx)
                .await?;

            let advance_to = match next {
                Next::End => break,
                Next::Node(explicit) => explicit,
                Next::Continue => match self.next_map.get(&node_id) {
                    Some(NextEntry::Unconditional(target)) => target.clone(),
                    Some(NextEntry::Conditional(router)) => router.resolve(&current_state),
                    None => END.to_string(),
                },
            };

            if advance_to == END {
                break;
            }
            node_id = advance_to;
        }

        Ok(current_state)
    }

    async fn run_node(
        &self,
        node: Arc<dyn Node<S>>,
        node_id: String,
        state: S,
        ctx: &RunContext<S>,
    ) -> Result<(S, Next), AgentError> {
        match &self.middleware {
            None => node.run_with_context(state, ctx).await,
            Some(middleware) => {
                let node = node.clone();
                let ctx_owned = ctx.clone();
                let inner: Box<
                    dyn FnOnce(S) -> Pin<Box<dyn std::future::Future<Output = Result<(S, Next), AgentError>> + Send>>
                        + Send,
                > = Box::new(move |s: S| Box::pin(async move { node.run_with_context(s, &ctx_owned).await }));
                middleware.around_run(&node_id, state, inner).await
            }
        }
    }

    async fn maybe_checkpoint(
        &self,
        state: &S,
        node_id: &str,
        step: i64,
        source: CheckpointSource,
        ctx: &RunContext<S>,
    ) -> Result<(), AgentError> {
        let (Some(checkpointer), Some(_thread_id)) = (&self.checkpointer, ctx.thread_id()) else {
            return Ok(());
        };
        let checkpoint_id = format!("{}-{}", ctx.thread_id().unwrap_or_default(), step);
        let checkpoint = Checkpoint::new(checkpoint_id, state.clone(), source, node_id, step);
        checkpointer
            .put(&ctx.config, &checkpoint)
            .await
            .map_err(|e| AgentError::Checkpoint(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{StateGraph, START};
    use async_trait::async_trait;

    #[derive(Clone, Debug, PartialEq)]
    struct Counter(i32);

    struct Increment;

    #[async_trait]
    impl Node<Counter> for Increment {
        fn id(&self) -> &str {
            "increment"
        }
        async fn run(&self, state: Counter) -> Result<(Counter, Next), AgentError> {
            Ok((Counter(state.0 + 1), Next::Continue))
        }
    }

    #[tokio::test]
    async fn invoke_runs_single_node_to_end() {
        let mut graph = StateGraph::<Counter>::new();
        graph.add_node("increment", Arc::new(Increment));
        graph.add_edge(START, "increment");
        graph.add_edge("increment", END);
        let compiled = graph.compile().unwrap();

        let result = compiled.invoke(Counter(0)).await.unwrap();
        assert_eq!(result, Counter(1));
    }

    #[tokio::test]
    async fn invoke_with_context_persists_checkpoints_when_thread_id_set() {
        use crate::memory::MemorySaver;

        let mut graph = StateGraph::<Counter>::new();
        graph.add_node("increment", Arc::new(Increment));
        graph.add_edge(START, "increment");
        graph.add_edge("increment", END);
        let saver: Arc<dyn Checkpointer<Counter>> = Arc::new(MemorySaver::new());
        let compiled = graph.compile_with_checkpointer(saver.clone()).unwrap();

        let config = RunnableConfig::new("thread-1");
        let ctx = RunContext::new(config.clone());
        compiled.invoke_with_context(Counter(0), &ctx).await.unwrap();

        let (checkpoint, _) = saver.get_tuple(&config).await.unwrap().unwrap();
        assert_eq!(checkpoint.state, Counter(1));
    }
}
