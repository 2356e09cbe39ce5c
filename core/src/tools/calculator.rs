//! Built-in arithmetic tool: `{a, b} -> {"sum": a + b}`.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};
use crate::tools::BuiltinTool;

pub const TOOL_CALCULATOR: &str = "calculator";

pub struct CalculatorTool;

#[async_trait]
impl BuiltinTool for CalculatorTool {
    fn name(&self) -> &str {
        TOOL_CALCULATOR
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_CALCULATOR.to_string(),
            description: Some("Adds two numbers".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "a": {"type": "number"},
                    "b": {"type": "number"},
                },
                "required": ["a", "b"],
            }),
        }
    }

    async fn call(&self, args: Value, _ctx: Option<&ToolCallContext>) -> Result<ToolCallContent, ToolSourceError> {
        let a = args
            .get("a")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ToolSourceError::InvalidArguments("missing 'a'".into()))?;
        let b = args
            .get("b")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ToolSourceError::InvalidArguments("missing 'b'".into()))?;

        Ok(ToolCallContent {
            text: json!({"sum": a + b}).to_string(),
        })
    }
}
