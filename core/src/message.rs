//! Conversation message type shared by the provider gateway, ReAct nodes, and
//! the tool executor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::ToolCall;

/// Who produced a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single message in a conversation.
///
/// Mirrors the OpenAI-compatible chat message shape so provider adapters can
/// serialize it with minimal translation: `tool_calls` is populated on an
/// assistant message that invoked tools; `tool_call_id`/`name` are populated on
/// the tool-result message that answers one of those calls.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Option<Role>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Some(Role::System),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Some(Role::User),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Some(Role::Assistant),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Some(Role::Assistant),
            content: content.into(),
            tool_calls,
            ..Default::default()
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Some(Role::Tool),
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self.role, Some(Role::Assistant))
    }
}

/// Arguments passed with a tool definition's schema, or a tool-call's parsed args.
pub type ToolArguments = Value;
