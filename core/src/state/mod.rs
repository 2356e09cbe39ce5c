//! `AgentState`: the state threaded through the ReAct graph (C2).

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// A tool invocation requested by the model. `arguments` is a JSON-encoded
/// string so streaming accumulation (see [`crate::llm::ToolCallDelta`]) can
/// concatenate partial argument text before attempting to parse it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: Option<String>,
    pub name: String,
    pub arguments: String,
}

/// The outcome of executing one [`ToolCall`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: Option<String>,
    pub name: String,
    pub content: String,
    pub success: bool,
}

/// A record of the plan produced before the think/act loop starts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningRecord {
    pub summary: String,
}

/// Outcome of the validate node's pass over the draft response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    #[default]
    Passed,
    Warning,
    Failed,
}

/// One issue surfaced by the validate node (e.g. a masked sensitive-data match).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: String,
    pub message: String,
}

/// Where a run currently is in the plan → think → act → validate → respond cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    #[default]
    Thinking,
    ToolCalling,
    Validating,
    Responding,
    Done,
    Error,
}

/// State threaded through every node of the ReAct graph for one chat turn.
///
/// Nodes consume and return this type wholesale (full-replace semantics, see
/// [`crate::channels::ReplaceUpdater`]); there is no per-field merge.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AgentState {
    pub session_id: String,
    pub user_id: Option<String>,

    /// Full conversation so far, oldest first.
    pub messages: Vec<Message>,
    /// The user input that triggered this turn (also appended to `messages`).
    pub input: String,

    pub model_id: String,
    /// Explicit provider selector; when absent, inferred from `model_id`
    /// (see [`crate::provider::infer_provider_kind`]).
    pub provider: Option<String>,
    pub temperature: Option<f32>,

    /// Tools the model is allowed to call this turn.
    pub available_tools: Vec<crate::catalog::ToolDefinition>,

    pub pending_tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,

    pub final_response: Option<String>,
    pub reasoning_text: Option<String>,

    pub iteration: u32,
    pub max_iterations: u32,

    pub status: AgentStatus,

    pub planning: Option<PlanningRecord>,
    pub validation_status: ValidationStatus,
    pub validation_issues: Vec<ValidationIssue>,
}

impl AgentState {
    pub fn new(session_id: impl Into<String>, input: impl Into<String>, model_id: impl Into<String>) -> Self {
        let input = input.into();
        Self {
            session_id: session_id.into(),
            user_id: None,
            messages: vec![Message::user(input.clone())],
            input,
            model_id: model_id.into(),
            provider: None,
            temperature: None,
            available_tools: Vec::new(),
            pending_tool_calls: Vec::new(),
            tool_results: Vec::new(),
            final_response: None,
            reasoning_text: None,
            iteration: 0,
            max_iterations: 10,
            status: AgentStatus::Thinking,
            planning: None,
            validation_status: ValidationStatus::Passed,
            validation_issues: Vec::new(),
        }
    }

    /// Whether the iteration cap has been reached (checked at the top of tool_calling).
    pub fn at_iteration_cap(&self) -> bool {
        self.iteration >= self.max_iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_seeds_user_message_and_defaults() {
        let state = AgentState::new("s1", "hello", "gpt-4o");
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].content, "hello");
        assert_eq!(state.max_iterations, 10);
        assert!(!state.at_iteration_cap());
    }

    #[test]
    fn at_iteration_cap_true_when_reached() {
        let mut state = AgentState::new("s1", "hi", "gpt-4o");
        state.max_iterations = 2;
        state.iteration = 2;
        assert!(state.at_iteration_cap());
    }
}
