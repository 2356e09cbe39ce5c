use async_trait::async_trait;

use crate::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

/// A built-in tool the executor can dispatch to directly, ahead of any
/// catalog lookup (see `crate::executor::ToolExecutor::dispatch`, step 1).
#[async_trait]
pub trait BuiltinTool: Send + Sync {
    /// Unique name; must match the name the model is given in its tool list.
    fn name(&self) -> &str;

    fn spec(&self) -> ToolSpec;

    async fn call(
        &self,
        args: serde_json::Value,
        ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError>;
}
