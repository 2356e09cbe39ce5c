//! Plan node: on the first iteration only, asks the model to classify intent
//! and sketch a plan before the think/act loop starts. Advisory: parse
//! failures are swallowed and the iteration counter is not advanced.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AgentError;
use crate::graph::{Next, RunContext};
use crate::llm::{ChatParams, LlmClient, ToolChoiceMode};
use crate::message::Message;
use crate::state::{AgentState, PlanningRecord};
use crate::stream::{ChunkToStreamSender, StreamMode};
use crate::Node;

const PLAN_PROMPT: &str = "Perceive the user's need and produce a JSON object with fields \
`intent` (one of query, analysis, prediction, workflow, conversation, unknown), \
`confidence` (0 to 1), `reasoning`, `plan_steps` (array of strings), `entities` (object).";

pub struct PlanNode {
    llm: Arc<dyn LlmClient>,
}

impl PlanNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Node<AgentState> for PlanNode {
    fn id(&self) -> &str {
        "plan"
    }

    async fn run(&self, state: AgentState) -> Result<(AgentState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }

    async fn run_with_context(
        &self,
        mut state: AgentState,
        ctx: &RunContext<AgentState>,
    ) -> Result<(AgentState, Next), AgentError> {
        if state.iteration != 0 {
            return Ok((state, Next::Continue));
        }

        let mut messages = vec![Message::system(PLAN_PROMPT)];
        messages.extend(state.messages.clone());

        let params = ChatParams {
            model_id: state.model_id.clone(),
            provider: state.provider.clone(),
            temperature: Some(0.0),
            tools: Vec::new(),
            tool_choice: ToolChoiceMode::None,
        };

        let response = if ctx.is_mode_enabled(StreamMode::Messages) {
            if let Some(stream_tx) = ctx.stream_sender() {
                let forwarder = ChunkToStreamSender::new(stream_tx.clone(), self.id());
                let chunk_tx = forwarder.channel();
                self.llm.invoke_stream_with_tool_delta(&messages, &params, Some(chunk_tx), None).await
            } else {
                self.llm.invoke(&messages, &params).await
            }
        } else {
            self.llm.invoke(&messages, &params).await
        };

        if let Ok(response) = response {
            if let Ok(_parsed) = serde_json::from_str::<Value>(&response.content) {
                state.planning = Some(PlanningRecord { summary: response.content });
            }
        }

        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::memory::RunnableConfig;
    use crate::stream::StreamEvent;
    use std::collections::HashSet;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn records_planning_summary_on_valid_json() {
        let node = PlanNode::new(Arc::new(MockLlm::new(r#"{"intent":"query","confidence":0.9,"reasoning":"","plan_steps":[],"entities":{}}"#)));
        let state = AgentState::new("s1", "hi", "gpt-4o");
        let (new_state, _) = node.run(state).await.unwrap();
        assert!(new_state.planning.is_some());
    }

    #[tokio::test]
    async fn malformed_json_is_swallowed_without_error() {
        let node = PlanNode::new(Arc::new(MockLlm::new("not json")));
        let state = AgentState::new("s1", "hi", "gpt-4o");
        let (new_state, _) = node.run(state).await.unwrap();
        assert!(new_state.planning.is_none());
    }

    #[tokio::test]
    async fn skipped_entirely_past_iteration_zero() {
        let node = PlanNode::new(Arc::new(MockLlm::new(r#"{"intent":"query"}"#)));
        let mut state = AgentState::new("s1", "hi", "gpt-4o");
        state.iteration = 1;
        let (new_state, _) = node.run(state).await.unwrap();
        assert!(new_state.planning.is_none());
    }

    #[tokio::test]
    async fn run_with_context_forwards_reasoning_as_a_message_chunk_when_streaming() {
        let node = PlanNode::new(Arc::new(MockLlm::new(r#"{"intent":"query"}"#)));
        let state = AgentState::new("s1", "hi", "gpt-4o");

        let (tx, mut rx) = mpsc::channel(8);
        let mut modes = HashSet::new();
        modes.insert(StreamMode::Messages);
        let ctx = RunContext::with_stream(RunnableConfig::default(), tx, modes);

        let (new_state, _) = node.run_with_context(state, &ctx).await.unwrap();
        assert!(new_state.planning.is_some());

        let event = rx.recv().await.expect("a forwarded chunk");
        match event {
            StreamEvent::Messages(chunk) => assert_eq!(chunk.content, r#"{"intent":"query"}"#),
            other => panic!("expected a Messages chunk, got {other:?}"),
        }
    }
}
