//! Error types shared across the orchestration engine.

use thiserror::Error;

/// Errors from a provider adapter's HTTP call to an upstream chat completions API.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("model not supported by provider: {0}")]
    ModelNotSupported(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("provider call timed out")]
    Timeout,

    #[error("failed to parse provider response: {0}")]
    Parse(String),
}

/// Errors raised while executing a tool call.
#[derive(Debug, Error)]
#[error("tool '{tool_name}' failed: {message}")]
pub struct ToolExecutionError {
    pub tool_name: String,
    pub message: String,
}

/// Top-level error type for the agent graph and its nodes.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Tool(#[from] ToolExecutionError),

    #[error("dependency cycle among skill nodes: {0:?}")]
    DependencyCycle(Vec<String>),

    #[error("graph compilation error: {0}")]
    Compilation(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_cycle_display_lists_nodes() {
        let err = AgentError::DependencyCycle(vec!["a".into(), "b".into()]);
        assert!(err.to_string().contains("a"));
        assert!(err.to_string().contains("b"));
    }

    #[test]
    fn tool_execution_error_display_includes_tool_name() {
        let err = ToolExecutionError {
            tool_name: "calculator".into(),
            message: "division by zero".into(),
        };
        assert_eq!(err.to_string(), "tool 'calculator' failed: division by zero");
    }
}
