//! Multi-provider [`LlmClient`]: selects an adapter by explicit provider id,
//! explicit kind, or model-name inference, then dispatches to it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{AgentError, ProviderError};
use crate::message::Message;
use crate::stream::MessageChunk;

use super::{AnthropicAdapter, ChatParams, LlmClient, LlmResponse, OpenAiCompatibleAdapter, ToolCallDelta};

/// Which wire family a provider record speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    DeepSeek,
    Qwen,
    Moonshot,
    Zhipu,
    Anthropic,
    Gemini,
    Baidu,
}

impl ProviderKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::DeepSeek => "deepseek",
            Self::Qwen => "qwen",
            Self::Moonshot => "moonshot",
            Self::Zhipu => "zhipu",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Baidu => "baidu",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "openai" => Some(Self::OpenAi),
            "deepseek" => Some(Self::DeepSeek),
            "qwen" => Some(Self::Qwen),
            "moonshot" => Some(Self::Moonshot),
            "zhipu" => Some(Self::Zhipu),
            "anthropic" => Some(Self::Anthropic),
            "gemini" => Some(Self::Gemini),
            "baidu" => Some(Self::Baidu),
            _ => None,
        }
    }

    /// True for the openai-wire-compatible families (openai, deepseek, qwen,
    /// moonshot, zhipu); false for anthropic and the as-yet-unadapted kinds.
    fn is_openai_compatible(self) -> bool {
        matches!(self, Self::OpenAi | Self::DeepSeek | Self::Qwen | Self::Moonshot | Self::Zhipu)
    }
}

/// Infers a provider kind from a model id by substring match, per the fixed
/// table: `gpt`|`o1`→openai, `claude`→anthropic, `deepseek`→deepseek,
/// `qwen`→qwen, `glm`→zhipu, `moonshot`→moonshot, `gemini`→gemini,
/// `ernie`→baidu; default openai.
pub fn infer_provider_kind(model_id: &str) -> ProviderKind {
    let m = model_id.to_lowercase();
    if m.contains("gpt") || m.contains("o1") {
        ProviderKind::OpenAi
    } else if m.contains("claude") {
        ProviderKind::Anthropic
    } else if m.contains("deepseek") {
        ProviderKind::DeepSeek
    } else if m.contains("qwen") {
        ProviderKind::Qwen
    } else if m.contains("glm") {
        ProviderKind::Zhipu
    } else if m.contains("moonshot") {
        ProviderKind::Moonshot
    } else if m.contains("gemini") {
        ProviderKind::Gemini
    } else if m.contains("ernie") {
        ProviderKind::Baidu
    } else {
        ProviderKind::OpenAi
    }
}

/// A configured provider record, as seeded from `orch-config`.
#[derive(Clone, Debug)]
pub struct ProviderRecord {
    pub id: String,
    pub owner_id: Option<String>,
    pub kind: String,
    pub base_url: String,
    pub api_key: String,
    pub enabled: bool,
    pub models: Vec<String>,
}

impl ProviderRecord {
    fn is_selectable(&self) -> bool {
        self.enabled && !self.api_key.is_empty()
    }
}

enum Adapter {
    OpenAiCompatible(OpenAiCompatibleAdapter),
    Anthropic(AnthropicAdapter),
}

#[async_trait]
impl LlmClient for Adapter {
    async fn invoke(&self, messages: &[Message], params: &ChatParams) -> Result<LlmResponse, AgentError> {
        match self {
            Self::OpenAiCompatible(a) => a.invoke(messages, params).await,
            Self::Anthropic(a) => a.invoke(messages, params).await,
        }
    }

    async fn invoke_stream_with_tool_delta(
        &self,
        messages: &[Message],
        params: &ChatParams,
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
        tool_delta_tx: Option<mpsc::Sender<ToolCallDelta>>,
    ) -> Result<LlmResponse, AgentError> {
        match self {
            Self::OpenAiCompatible(a) => a.invoke_stream_with_tool_delta(messages, params, chunk_tx, tool_delta_tx).await,
            Self::Anthropic(a) => a.invoke_stream_with_tool_delta(messages, params, chunk_tx, tool_delta_tx).await,
        }
    }
}

/// Selects and calls a provider adapter per request, honoring explicit
/// provider id/kind or inferring one from the model id.
pub struct ProviderGateway {
    records: Vec<ProviderRecord>,
    /// Explicit-id selector: `params.provider` holding a record's `id`.
    by_id: HashMap<String, usize>,
}

impl ProviderGateway {
    pub fn new(records: Vec<ProviderRecord>) -> Self {
        let by_id = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        Self { records, by_id }
    }

    fn select(&self, params: &ChatParams) -> Result<&ProviderRecord, AgentError> {
        if let Some(selector) = &params.provider {
            if let Some(&idx) = self.by_id.get(selector) {
                let record = &self.records[idx];
                if record.is_selectable() {
                    return Ok(record);
                }
                return Err(ProviderError::NotConfigured(format!("provider '{}' is disabled", selector)).into());
            }
            if let Some(kind) = ProviderKind::from_str(selector) {
                return self.select_by_kind(kind);
            }
        }
        let kind = infer_provider_kind(&params.model_id);
        self.select_by_kind(kind)
    }

    fn select_by_kind(&self, kind: ProviderKind) -> Result<&ProviderRecord, AgentError> {
        self.records
            .iter()
            .find(|r| r.kind == kind.as_str() && r.is_selectable())
            .ok_or_else(|| ProviderError::NotConfigured(format!("no enabled provider of kind '{}'", kind.as_str())).into())
    }

    /// An empty `models` list means the provider record doesn't restrict
    /// which models it serves; a non-empty list is a hard allowlist.
    fn check_model_supported(&self, record: &ProviderRecord, model_id: &str) -> Result<(), AgentError> {
        if record.models.is_empty() || record.models.iter().any(|m| m == model_id) {
            Ok(())
        } else {
            Err(ProviderError::ModelNotSupported(format!(
                "model '{}' is not in provider '{}''s supported list",
                model_id, record.id
            ))
            .into())
        }
    }

    fn build_adapter(&self, record: &ProviderRecord) -> Result<Adapter, AgentError> {
        let kind = ProviderKind::from_str(&record.kind)
            .ok_or_else(|| ProviderError::NotConfigured(format!("unknown provider kind '{}'", record.kind)))?;
        if kind.is_openai_compatible() {
            Ok(Adapter::OpenAiCompatible(OpenAiCompatibleAdapter::new(
                record.base_url.clone(),
                record.api_key.clone(),
            )))
        } else if kind == ProviderKind::Anthropic {
            Ok(Adapter::Anthropic(AnthropicAdapter::new(record.base_url.clone(), record.api_key.clone())))
        } else {
            Err(ProviderError::ModelNotSupported(format!("no adapter implemented for kind '{}'", kind.as_str())).into())
        }
    }
}

#[async_trait]
impl LlmClient for ProviderGateway {
    async fn invoke(&self, messages: &[Message], params: &ChatParams) -> Result<LlmResponse, AgentError> {
        let record = self.select(params)?;
        self.check_model_supported(record, &params.model_id)?;
        let adapter = self.build_adapter(record)?;
        adapter.invoke(messages, params).await
    }

    async fn invoke_stream_with_tool_delta(
        &self,
        messages: &[Message],
        params: &ChatParams,
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
        tool_delta_tx: Option<mpsc::Sender<ToolCallDelta>>,
    ) -> Result<LlmResponse, AgentError> {
        let record = self.select(params)?;
        self.check_model_supported(record, &params.model_id)?;
        let adapter = self.build_adapter(record)?;
        adapter.invoke_stream_with_tool_delta(messages, params, chunk_tx, tool_delta_tx).await
    }
}
