//! Think node: rebuilds the provider message list, calls C1, and reads
//! whether the response carries tool calls or a final answer.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::AgentError;
use crate::graph::{Next, RunContext};
use crate::llm::{ChatParams, LlmClient, ToolChoiceMode};
use crate::message::Message;
use crate::state::{AgentState, AgentStatus};
use crate::stream::{ChunkToStreamSender, StreamEvent, StreamMode};
use crate::Node;

pub struct ThinkNode {
    llm: Arc<dyn LlmClient>,
}

impl ThinkNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    fn build_params(state: &AgentState) -> ChatParams {
        ChatParams {
            model_id: state.model_id.clone(),
            provider: state.provider.clone(),
            temperature: state.temperature,
            tools: state.available_tools.clone(),
            tool_choice: if state.available_tools.is_empty() {
                ToolChoiceMode::None
            } else {
                ToolChoiceMode::Auto
            },
        }
    }

    fn apply_response(mut state: AgentState, content: String, tool_calls: Vec<crate::state::ToolCall>) -> AgentState {
        if tool_calls.is_empty() {
            state.messages.push(Message::assistant(content.clone()));
            state.final_response = Some(content);
            state.status = AgentStatus::Done;
        } else {
            state.messages.push(Message::assistant_with_tool_calls(content.clone(), tool_calls.clone()));
            state.pending_tool_calls = tool_calls;
            state.reasoning_text = if content.is_empty() { None } else { Some(content) };
            state.status = AgentStatus::ToolCalling;
        }
        state
    }
}

#[async_trait]
impl Node<AgentState> for ThinkNode {
    fn id(&self) -> &str {
        "think"
    }

    async fn run(&self, state: AgentState) -> Result<(AgentState, Next), AgentError> {
        let params = Self::build_params(&state);
        let response = self.llm.invoke(&state.messages, &params).await?;
        let new_state = Self::apply_response(state, response.content, response.tool_calls);
        Ok((new_state, Next::Continue))
    }

    async fn run_with_context(
        &self,
        state: AgentState,
        ctx: &RunContext<AgentState>,
    ) -> Result<(AgentState, Next), AgentError> {
        let params = Self::build_params(&state);

        let response = if ctx.is_mode_enabled(StreamMode::Messages) {
            if let Some(stream_tx) = ctx.stream_sender() {
                let forwarder = ChunkToStreamSender::new(stream_tx.clone(), self.id());
                let chunk_tx = forwarder.channel();
                let (tool_delta_tx, mut tool_delta_rx) = mpsc::channel(64);
                let forward_tool_deltas = async {
                    while let Some(delta) = tool_delta_rx.recv().await {
                        if stream_tx.send(StreamEvent::ToolCallChunk(delta)).await.is_err() {
                            break;
                        }
                    }
                };
                let (result, _) = tokio::join!(
                    self.llm.invoke_stream_with_tool_delta(&state.messages, &params, Some(chunk_tx), Some(tool_delta_tx)),
                    forward_tool_deltas,
                );
                result?
            } else {
                self.llm.invoke(&state.messages, &params).await?
            }
        } else {
            self.llm.invoke(&state.messages, &params).await?
        };

        let new_state = Self::apply_response(state, response.content, response.tool_calls);
        Ok((new_state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::state::ToolCall;

    #[tokio::test]
    async fn no_tool_calls_marks_done_and_sets_final_response() {
        let node = ThinkNode::new(Arc::new(MockLlm::new("hello there")));
        let state = AgentState::new("s1", "hi", "gpt-4o");
        let (new_state, next) = node.run(state).await.unwrap();
        assert_eq!(new_state.status, AgentStatus::Done);
        assert_eq!(new_state.final_response.as_deref(), Some("hello there"));
        assert_eq!(next, Next::Continue);
    }

    #[tokio::test]
    async fn tool_calls_set_tool_calling_and_stash_pending_calls() {
        // Iteration is advanced by `validate` once the pair's tool results land,
        // not by `think` on the way out — see validate_node's tests.
        let call = ToolCall { id: Some("call_1".into()), name: "calculator".into(), arguments: "{}".into() };
        let node = ThinkNode::new(Arc::new(MockLlm::with_tool_calls("", vec![call])));
        let state = AgentState::new("s1", "add", "gpt-4o");
        let (new_state, _) = node.run(state).await.unwrap();
        assert_eq!(new_state.status, AgentStatus::ToolCalling);
        assert_eq!(new_state.iteration, 0);
        assert_eq!(new_state.pending_tool_calls.len(), 1);
    }
}
