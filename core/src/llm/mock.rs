//! Fixed-response [`LlmClient`] for tests that don't need a real provider.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::Message;
use crate::state::ToolCall;

use super::{ChatParams, LlmClient, LlmResponse, LlmUsage};

/// Returns a fixed response (and, optionally, fixed tool calls) regardless of
/// the messages or params it's invoked with.
#[derive(Clone, Debug, Default)]
pub struct MockLlm {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

impl MockLlm {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: vec![],
        }
    }

    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
        }
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, _messages: &[Message], _params: &ChatParams) -> Result<LlmResponse, AgentError> {
        Ok(LlmResponse {
            content: self.content.clone(),
            tool_calls: self.tool_calls.clone(),
            usage: Some(LlmUsage::default()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_llm_returns_fixed_content() {
        let llm = MockLlm::new("hello there");
        let resp = llm.invoke(&[], &ChatParams::default()).await.unwrap();
        assert_eq!(resp.content, "hello there");
        assert!(resp.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn mock_llm_returns_fixed_tool_calls() {
        let call = ToolCall {
            id: Some("call_1".into()),
            name: "calculator".into(),
            arguments: "{\"a\":128,\"b\":355}".into(),
        };
        let llm = MockLlm::with_tool_calls("", vec![call.clone()]);
        let resp = llm.invoke(&[], &ChatParams::default()).await.unwrap();
        assert_eq!(resp.tool_calls, vec![call]);
    }
}
