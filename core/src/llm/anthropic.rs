//! Adapter for the Anthropic Messages API: `POST {base_url}/v1/messages`,
//! system prompt hoisted out of the message list, tool use/result as content
//! blocks.

use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::error::{AgentError, ProviderError};
use crate::message::{Message, Role};
use crate::state::ToolCall;
use crate::stream::MessageChunk;

use super::{ChatParams, LlmClient, LlmResponse, LlmUsage, ToolCallDelta};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(120);
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicAdapter {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicAdapter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Splits messages into a hoisted system prompt and the remaining turns,
    /// rendered as Anthropic content blocks (`tool_use` / `tool_result`).
    fn split_system_and_turns(messages: &[Message]) -> (Option<String>, Vec<Value>) {
        let mut system = None;
        let mut turns = Vec::new();
        for m in messages {
            match m.role {
                Some(Role::System) => system = Some(m.content.clone()),
                Some(Role::Tool) => turns.push(json!({
                    "role": "user",
                    "content": [{
                        "type": "tool_result",
                        "tool_use_id": m.tool_call_id,
                        "content": m.content,
                    }]
                })),
                Some(Role::Assistant) if !m.tool_calls.is_empty() => {
                    let mut blocks = Vec::new();
                    if !m.content.is_empty() {
                        blocks.push(json!({"type": "text", "text": m.content}));
                    }
                    for tc in &m.tool_calls {
                        let input: Value = serde_json::from_str(&tc.arguments).unwrap_or(json!({}));
                        blocks.push(json!({
                            "type": "tool_use",
                            "id": tc.id,
                            "name": tc.name,
                            "input": input,
                        }));
                    }
                    turns.push(json!({"role": "assistant", "content": blocks}));
                }
                _ => turns.push(json!({
                    "role": if m.role == Some(Role::Assistant) { "assistant" } else { "user" },
                    "content": m.content,
                })),
            }
        }
        (system, turns)
    }

    fn build_request_body(&self, messages: &[Message], params: &ChatParams, stream: bool) -> Value {
        let (system, turns) = Self::split_system_and_turns(messages);
        let tools: Vec<Value> = params
            .tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "input_schema": t.parameters,
                })
            })
            .collect();

        let mut body = json!({
            "model": params.model_id,
            "messages": turns,
            "max_tokens": 4096,
            "stream": stream,
        });
        if let Some(obj) = body.as_object_mut() {
            if let Some(system) = system {
                obj.insert("system".into(), json!(system));
            }
            if let Some(temp) = params.temperature {
                obj.insert("temperature".into(), json!(temp));
            }
            if !tools.is_empty() {
                obj.insert("tools".into(), json!(tools));
            }
        }
        body
    }
}

#[async_trait]
impl LlmClient for AnthropicAdapter {
    async fn invoke(&self, messages: &[Message], params: &ChatParams) -> Result<LlmResponse, AgentError> {
        let body = self.build_request_body(messages, params, false);
        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .timeout(PROVIDER_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Transport(e)
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        if let Some(blocks) = payload.get("content").and_then(|v| v.as_array()) {
            for block in blocks {
                match block.get("type").and_then(|v| v.as_str()) {
                    Some("text") => {
                        content.push_str(block.get("text").and_then(|v| v.as_str()).unwrap_or_default());
                    }
                    Some("tool_use") => tool_calls.push(ToolCall {
                        id: block.get("id").and_then(|v| v.as_str()).map(String::from),
                        name: block.get("name").and_then(|v| v.as_str()).unwrap_or_default().into(),
                        arguments: block.get("input").map(|v| v.to_string()).unwrap_or_else(|| "{}".into()),
                    }),
                    _ => {}
                }
            }
        }
        let usage = payload.get("usage").map(|u| LlmUsage {
            prompt_tokens: u.get("input_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            completion_tokens: u.get("output_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            total_tokens: (u.get("input_tokens").and_then(|v| v.as_u64()).unwrap_or(0)
                + u.get("output_tokens").and_then(|v| v.as_u64()).unwrap_or(0)) as u32,
        });

        Ok(LlmResponse {
            content,
            tool_calls,
            usage,
        })
    }

    async fn invoke_stream_with_tool_delta(
        &self,
        messages: &[Message],
        params: &ChatParams,
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
        tool_delta_tx: Option<mpsc::Sender<ToolCallDelta>>,
    ) -> Result<LlmResponse, AgentError> {
        let body = self.build_request_body(messages, params, true);
        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .timeout(PROVIDER_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Transport(e)
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let mut content = String::new();
        let mut current_index = 0usize;
        let mut current_id: Option<String> = None;
        let mut current_name = String::new();
        let mut tool_calls = Vec::new();
        let mut args_buf = String::new();
        let mut in_tool_use = false;
        let usage = None;

        let mut stream = resp.bytes_stream().eventsource();
        while let Some(event) = stream.next().await {
            let event = event.map_err(|e| ProviderError::Parse(e.to_string()))?;
            let chunk: Value = match serde_json::from_str(&event.data) {
                Ok(v) => v,
                Err(_) => continue,
            };
            match chunk.get("type").and_then(|v| v.as_str()) {
                Some("content_block_start") => {
                    if chunk
                        .get("content_block")
                        .and_then(|b| b.get("type"))
                        .and_then(|v| v.as_str())
                        == Some("tool_use")
                    {
                        in_tool_use = true;
                        current_index = chunk.get("index").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
                        current_id = chunk
                            .get("content_block")
                            .and_then(|b| b.get("id"))
                            .and_then(|v| v.as_str())
                            .map(String::from);
                        current_name = chunk
                            .get("content_block")
                            .and_then(|b| b.get("name"))
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string();
                        args_buf.clear();
                        if let Some(tx) = &tool_delta_tx {
                            let _ = tx
                                .send(ToolCallDelta {
                                    index: current_index,
                                    call_id: current_id.clone(),
                                    name: Some(current_name.clone()),
                                    arguments_delta: String::new(),
                                })
                                .await;
                        }
                    }
                }
                Some("content_block_delta") => {
                    let delta = chunk.get("delta");
                    if let Some(text) = delta.and_then(|d| d.get("text")).and_then(|v| v.as_str()) {
                        content.push_str(text);
                        if let Some(tx) = &chunk_tx {
                            let _ = tx
                                .send(MessageChunk {
                                    content: text.to_string(),
                                })
                                .await;
                        }
                    }
                    if in_tool_use {
                        if let Some(partial) = delta.and_then(|d| d.get("partial_json")).and_then(|v| v.as_str()) {
                            args_buf.push_str(partial);
                            if let Some(tx) = &tool_delta_tx {
                                let _ = tx
                                    .send(ToolCallDelta {
                                        index: current_index,
                                        call_id: None,
                                        name: None,
                                        arguments_delta: partial.to_string(),
                                    })
                                    .await;
                            }
                        }
                    }
                }
                Some("content_block_stop") => {
                    if in_tool_use {
                        let arguments = match serde_json::from_str::<Value>(&args_buf) {
                            Ok(v) if v.is_object() => args_buf.clone(),
                            _ => json!({ "_raw_args": args_buf }).to_string(),
                        };
                        tool_calls.push(ToolCall {
                            id: current_id.take(),
                            name: std::mem::take(&mut current_name),
                            arguments,
                        });
                        in_tool_use = false;
                    }
                }
                Some("message_stop") => break,
                _ => {}
            }
        }

        Ok(LlmResponse {
            content,
            tool_calls,
            usage,
        })
    }
}
