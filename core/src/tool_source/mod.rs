//! Types shared between built-in tool implementations and the tool executor.

mod context;

pub use context::ToolCallContext;

use serde_json::Value;
use thiserror::Error;

/// Description of a built-in tool, sent to the provider as part of the tool
/// list and used to validate calls before dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Result of a successful built-in tool call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolCallContent {
    pub text: String,
}

/// Errors a built-in tool's `call` may return.
#[derive(Debug, Error)]
pub enum ToolSourceError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("execution failed: {0}")]
    Execution(String),
}
