//! Built-in tools dispatched directly by the tool executor (C3), ahead of any
//! catalog-registered tool.

mod calculator;
mod r#trait;

pub use calculator::{CalculatorTool, TOOL_CALCULATOR};
pub use r#trait::BuiltinTool;
