//! SSE event types the client sees for one chat turn: `thinking`, `tool_call`,
//! `tool_result`, `message`, `error`, `done`.
//!
//! State-carrying variants use `serde_json::Value` for tool arguments/results
//! so the bridge in `orch-serve` doesn't need a second copy of the tool-call
//! accumulator's shapes.

use serde::Serialize;
use serde_json::Value;

/// One step of model or planning reasoning shown to the user as it streams.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ThinkingStatus {
    InProgress,
    Completed,
    Failed,
}

/// Lifecycle of one tool invocation, as observed across several `tool_call` frames.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Calling,
    Done,
    Failed,
}

/// Categorical bucket a tool call is grouped under in the UI, derived from the
/// tool name via [`tool_call_group`].
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallGroup {
    Search,
    Browse,
    File,
    Mcp,
    Code,
    Generic,
}

impl ToolCallGroup {
    /// The group's Chinese display label, matching the fixed keyword table.
    pub fn label(self) -> &'static str {
        match self {
            ToolCallGroup::Search => "搜索信息",
            ToolCallGroup::Browse => "深度访问",
            ToolCallGroup::File => "文件操作",
            ToolCallGroup::Mcp => "MCP服务调用",
            ToolCallGroup::Code => "代码执行",
            ToolCallGroup::Generic => "工具调用",
        }
    }
}

/// Derives a tool call's UI group from its name via a fixed keyword table.
/// Falls through to `Generic` ("工具调用") when nothing matches.
pub fn tool_call_group(tool_name: &str) -> ToolCallGroup {
    let name = tool_name.to_lowercase();
    if name.contains("search") || name.contains("query") {
        ToolCallGroup::Search
    } else if name.contains("browse") || name.contains("fetch") || name.contains("web") {
        ToolCallGroup::Browse
    } else if name.contains("file") || name.contains("read") || name.contains("write") {
        ToolCallGroup::File
    } else if name.contains("mcp") {
        ToolCallGroup::Mcp
    } else if name.contains("code") || name.contains("exec") {
        ToolCallGroup::Code
    } else {
        ToolCallGroup::Generic
    }
}

/// A short human string for the tool-call row, e.g. `calculator(op=add)`.
pub fn tool_call_display_title(tool_name: &str, arguments: &Value) -> String {
    match arguments.as_object().and_then(|o| o.iter().next()) {
        Some((key, value)) => format!("{tool_name}({key}={value})"),
        None => tool_name.to_string(),
    }
}

/// Wire-level event emitted to the client for one chat turn, matching the
/// transport contract: `data: {"event":"<name>","data":"<json string>"}`.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum SseEvent {
    Thinking {
        id: String,
        title: String,
        status: ThinkingStatus,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        accumulated: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        group: Option<String>,
    },
    ToolCall {
        id: String,
        name: String,
        arguments: Value,
        status: ToolCallStatus,
        group: String,
        group_id: String,
        display_title: String,
        sub_item_type: String,
    },
    ToolResult {
        id: String,
        name: String,
        result: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Message {
        content: String,
    },
    Error {
        code: String,
        message: String,
    },
    Done {},
}

impl SseEvent {
    /// Serializes `{"event": ..., "data": ...}` and returns the data half
    /// already JSON-stringified, matching the transport's `data` field being
    /// a JSON *string*, not a nested object.
    pub fn to_frame_value(&self) -> Result<Value, serde_json::Error> {
        let tagged = serde_json::to_value(self)?;
        let event = tagged
            .get("event")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let data = tagged.get("data").cloned().unwrap_or(Value::Null);
        Ok(serde_json::json!({
            "event": event,
            "data": serde_json::to_string(&data)?,
        }))
    }
}
