//! Adapter for the OpenAI-compatible chat completions family: openai,
//! deepseek, qwen, moonshot, zhipu all speak this wire shape.

use std::collections::BTreeMap;
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

use super::{ChatParams, LlmClient, LlmResponse, LlmUsage, ToolCallDelta, ToolChoiceMode};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(120);

/// Adapter for `POST {base_url}/chat/completions`, speaking the OpenAI wire
/// format shared by openai/deepseek/qwen/moonshot/zhipu.
pub struct OpenAiCompatibleAdapter {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleAdapter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn role_str(role: Option<Role>) -> &'static str {
        match role {
            Some(Role::System) => "system",
            Some(Role::User) | None => "user",
            Some(Role::Assistant) => "assistant",
            Some(Role::Tool) => "tool",
        }
    }

    fn build_request_body(&self, messages: &[Message], params: &ChatParams, stream: bool) -> Value {
        let messages: Vec<Value> = messages
            .iter()
            .map(|m| {
                let mut obj = json!({
                    "role": Self::role_str(m.role),
                    "content": m.content,
                });
                if let Some(map) = obj.as_object_mut() {
                    if !m.tool_calls.is_empty() {
                        map.insert(
                            "tool_calls".into(),
                            json!(m
                                .tool_calls
                                .iter()
                                .map(|tc| json!({
                                    "id": tc.id,
                                    "type": "function",
                                    "function": {"name": tc.name, "arguments": tc.arguments},
                                }))
                                .collect::<Vec<_>>()),
                        );
                    }
                    if let Some(id) = &m.tool_call_id {
                        map.insert("tool_call_id".into(), json!(id));
                    }
                    if let Some(name) = &m.name {
                        map.insert("name".into(), json!(name));
                    }
                }
                obj
            })
            .collect();

        let tools: Vec<Value> = params
            .tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect();

        let mut body = json!({
            "model": params.model_id,
            "messages": messages,
            "stream": stream,
        });
        if let Some(obj) = body.as_object_mut() {
            if let Some(temp) = params.temperature {
                obj.insert("temperature".into(), json!(temp));
            }
            if !tools.is_empty() {
                obj.insert("tools".into(), json!(tools));
                let choice = match params.tool_choice {
                    ToolChoiceMode::Auto => "auto",
                    ToolChoiceMode::None => "none",
                    ToolChoiceMode::Required => "required",
                };
                obj.insert("tool_choice".into(), json!(choice));
            }
        }
        body
    }

    fn parse_tool_calls(value: &Value) -> Vec<ToolCall> {
        value
            .as_array()
            .map(|arr| {
                arr.iter()
                    .map(|tc| ToolCall {
                        id: tc.get("id").and_then(|v| v.as_str()).map(String::from),
                        name: tc
                            .get("function")
                            .and_then(|f| f.get("name"))
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                        arguments: tc
                            .get("function")
                            .and_then(|f| f.get("arguments"))
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleAdapter {
    async fn invoke(&self, messages: &[Message], params: &ChatParams) -> Result<LlmResponse, AgentError> {
        let body = self.build_request_body(messages, params, false);
        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
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

        let choice = payload
            .get("choices")
            .and_then(|c| c.get(0))
            .ok_or_else(|| ProviderError::Parse("missing choices[0]".into()))?;
        let message = choice.get("message").cloned().unwrap_or_default();
        let content = message
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let tool_calls = message
            .get("tool_calls")
            .map(Self::parse_tool_calls)
            .unwrap_or_default();
        let usage = payload.get("usage").map(|u| LlmUsage {
            prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            completion_tokens: u.get("completion_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
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
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
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
        // index -> (id, name, arguments)
        let mut positions: BTreeMap<usize, (Option<String>, String, String)> = BTreeMap::new();
        let mut usage = None;

        let mut stream = resp.bytes_stream().eventsource();
        while let Some(event) = stream.next().await {
            let event = event.map_err(|e| ProviderError::Parse(e.to_string()))?;
            if event.data == "[DONE]" {
                break;
            }
            let chunk: Value = match serde_json::from_str(&event.data) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if let Some(u) = chunk.get("usage") {
                usage = Some(LlmUsage {
                    prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                    completion_tokens: u.get("completion_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                    total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                });
            }
            let Some(delta) = chunk
                .get("choices")
                .and_then(|c| c.get(0))
                .and_then(|c| c.get("delta"))
            else {
                continue;
            };
            if let Some(text) = delta.get("content").and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    content.push_str(text);
                    if let Some(tx) = &chunk_tx {
                        let _ = tx
                            .send(MessageChunk {
                                content: text.to_string(),
                            })
                            .await;
                    }
                }
            }
            if let Some(tool_calls) = delta.get("tool_calls").and_then(|v| v.as_array()) {
                for tc in tool_calls {
                    let index = tc.get("index").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
                    let id = tc.get("id").and_then(|v| v.as_str()).map(String::from);
                    let name = tc
                        .get("function")
                        .and_then(|f| f.get("name"))
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    let args_delta = tc
                        .get("function")
                        .and_then(|f| f.get("arguments"))
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();

                    let entry = positions.entry(index).or_insert((None, String::new(), String::new()));
                    if entry.0.is_none() {
                        entry.0 = id.clone();
                    }
                    entry.1.push_str(&name);
                    entry.2.push_str(&args_delta);

                    if let Some(tx) = &tool_delta_tx {
                        let _ = tx
                            .send(ToolCallDelta {
                                index,
                                call_id: id,
                                name: if name.is_empty() { None } else { Some(name) },
                                arguments_delta: args_delta,
                            })
                            .await;
                    }
                }
            }
        }

        let tool_calls = positions
            .into_values()
            .map(|(id, name, args)| {
                let arguments = match serde_json::from_str::<Value>(&args) {
                    Ok(v) if v.is_object() => args,
                    _ => json!({ "_raw_args": args }).to_string(),
                };
                ToolCall { id, name, arguments }
            })
            .collect();

        Ok(LlmResponse {
            content,
            tool_calls,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tool_calls_reads_function_name_and_arguments() {
        let value = json!([
            {"id": "call_1", "function": {"name": "calculator", "arguments": "{\"a\":1}"}}
        ]);
        let calls = OpenAiCompatibleAdapter::parse_tool_calls(&value);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "calculator");
        assert_eq!(calls[0].arguments, "{\"a\":1}");
    }

    #[test]
    fn build_request_body_includes_tools_and_tool_choice() {
        let adapter = OpenAiCompatibleAdapter::new("https://api.example.com/v1", "key");
        let params = ChatParams {
            model_id: "gpt-4o".into(),
            tools: vec![crate::catalog::ToolDefinition {
                name: "calculator".into(),
                description: "adds numbers".into(),
                parameters: json!({}),
            }],
            tool_choice: ToolChoiceMode::Required,
            ..Default::default()
        };
        let body = adapter.build_request_body(&[Message::user("hi")], &params, false);
        assert_eq!(body["tool_choice"], "required");
        assert_eq!(body["tools"][0]["function"]["name"], "calculator");
    }
}
