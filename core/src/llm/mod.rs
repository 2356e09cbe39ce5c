//! Provider gateway (C1): a uniform [`LlmClient`] interface over OpenAI-compatible
//! and Anthropic-shaped chat completion APIs, with streaming tool-call
//! accumulation and provider selection by id or by `model_id` inference.
//!
//! # Streaming Support
//!
//! The `LlmClient` trait supports streaming via `invoke_stream_with_tool_delta()`,
//! which accepts optional senders for text chunks and tool-call argument deltas.
//! [`ProviderGateway`] forwards whatever its adapter emits; [`MockLlm`] sends the
//! full response as a single chunk via the default implementation.

mod anthropic;
mod gateway;
mod mock;
mod openai_compatible;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::catalog::ToolDefinition;
use crate::error::AgentError;
use crate::message::Message;
use crate::state::ToolCall;
use crate::stream::MessageChunk;

pub use anthropic::AnthropicAdapter;
pub use gateway::{infer_provider_kind, ProviderGateway, ProviderKind, ProviderRecord};
pub use mock::MockLlm;
pub use openai_compatible::OpenAiCompatibleAdapter;

/// Tool choice mode for chat completions: when tools are present, controls whether
/// the model may choose (auto), must not use (none), or must use (required).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolChoiceMode {
    #[default]
    Auto,
    None,
    Required,
}

impl std::str::FromStr for ToolChoiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "none" => Ok(Self::None),
            "required" => Ok(Self::Required),
            _ => Err(format!(
                "unknown tool_choice: {} (use auto, none, or required)",
                s
            )),
        }
    }
}

/// Delta for one tool call from provider streaming (for tool_call_chunk events).
///
/// Per tool-call position (`index`), accumulate `id` (set once), `name`
/// (concatenation), and `arguments_delta` (concatenation of raw JSON text).
#[derive(Clone, Debug)]
pub struct ToolCallDelta {
    pub index: usize,
    pub call_id: Option<String>,
    pub name: Option<String>,
    pub arguments_delta: String,
}

/// Token usage for one LLM call (prompt + completion).
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from an LLM completion: assistant message text and optional tool calls.
#[derive(Clone, Debug, Default)]
pub struct LlmResponse {
    pub content: String,
    /// Tool calls from this turn; empty means no tools, observe → respond.
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<LlmUsage>,
}

/// Per-call parameters that vary with the request rather than the adapter:
/// which model, which provider (explicit or to be inferred), sampling
/// temperature, and which tools the model may call.
#[derive(Clone, Debug, Default)]
pub struct ChatParams {
    pub model_id: String,
    pub provider: Option<String>,
    pub temperature: Option<f32>,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: ToolChoiceMode,
}

/// LLM client: given messages and call parameters, returns assistant text and
/// any tool invocations. Implementations: [`MockLlm`] (fixed response, for
/// tests), [`ProviderGateway`] (selects and calls a real provider adapter).
///
/// # Streaming
///
/// Default implementation of `invoke_stream_with_tool_delta` calls `invoke()`
/// and sends the full content as one chunk; real adapters override it to
/// forward tokens and tool-call deltas as they arrive.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke(&self, messages: &[Message], params: &ChatParams) -> Result<LlmResponse, AgentError>;

    async fn invoke_stream_with_tool_delta(
        &self,
        messages: &[Message],
        params: &ChatParams,
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
        _tool_delta_tx: Option<mpsc::Sender<ToolCallDelta>>,
    ) -> Result<LlmResponse, AgentError> {
        let response = self.invoke(messages, params).await?;
        if let Some(tx) = chunk_tx {
            if !response.content.is_empty() {
                let _ = tx
                    .send(MessageChunk {
                        content: response.content.clone(),
                    })
                    .await;
            }
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubLlm {
        content: String,
    }

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn invoke(&self, _messages: &[Message], _params: &ChatParams) -> Result<LlmResponse, AgentError> {
            Ok(LlmResponse {
                content: self.content.clone(),
                tool_calls: vec![],
                usage: None,
            })
        }
    }

    #[test]
    fn tool_choice_mode_from_str_parses_known_values() {
        assert_eq!("auto".parse::<ToolChoiceMode>().unwrap(), ToolChoiceMode::Auto);
        assert_eq!("none".parse::<ToolChoiceMode>().unwrap(), ToolChoiceMode::None);
        assert_eq!("required".parse::<ToolChoiceMode>().unwrap(), ToolChoiceMode::Required);
    }

    #[test]
    fn tool_choice_mode_from_str_rejects_unknown_value() {
        let err = "unexpected".parse::<ToolChoiceMode>().unwrap_err();
        assert!(err.contains("unknown tool_choice"));
    }

    #[tokio::test]
    async fn default_invoke_stream_sends_single_chunk_when_enabled() {
        let llm = StubLlm { content: "hello".to_string() };
        let (tx, mut rx) = mpsc::channel(2);
        let resp = llm
            .invoke_stream_with_tool_delta(&[], &ChatParams::default(), Some(tx), None)
            .await
            .unwrap();
        assert_eq!(resp.content, "hello");
        let chunk = rx.recv().await.expect("one chunk");
        assert_eq!(chunk.content, "hello");
    }
}
