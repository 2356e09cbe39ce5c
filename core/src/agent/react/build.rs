//! Wires `plan`, `think`, `execute_tools`, `validate`, `respond`, `error` into
//! the six-node graph described by the conditional edge table:
//!
//! ```text
//! plan → think
//! think ⟶ execute_tools   if status=tool_calling and iteration<cap
//!       ⟶ respond         if status=done or iteration≥cap
//! execute_tools → validate  always
//! validate ⟶ think         if iteration<cap
//!          ⟶ respond       otherwise
//! respond → end
//! error   → end
//! ```

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::executor::ToolExecutor;
use crate::graph::{CompilationError, CompiledStateGraph, StateGraph, END, START};
use crate::llm::LlmClient;
use crate::state::{AgentState, AgentStatus};

use super::error_node::ErrorNode;
use super::execute_tools_node::ExecuteToolsNode;
use super::plan_node::PlanNode;
use super::respond_node::RespondNode;
use super::think_node::ThinkNode;
use super::validate_node::ValidateNode;

fn think_route(state: &AgentState) -> String {
    if state.status == AgentStatus::ToolCalling && !state.at_iteration_cap() {
        "execute_tools".to_string()
    } else {
        "respond".to_string()
    }
}

fn validate_route(state: &AgentState) -> String {
    if state.at_iteration_cap() {
        "respond".to_string()
    } else {
        "think".to_string()
    }
}

/// Assembles the compiled ReAct graph for one chat turn.
pub fn build_react_graph(
    llm: Arc<dyn LlmClient>,
    executor: Arc<ToolExecutor>,
    catalog: Arc<dyn Catalog>,
) -> Result<CompiledStateGraph<AgentState>, CompilationError> {
    let mut graph: StateGraph<AgentState> = StateGraph::new();

    graph
        .add_node("plan", Arc::new(PlanNode::new(llm.clone())))
        .add_node("think", Arc::new(ThinkNode::new(llm)))
        .add_node("execute_tools", Arc::new(ExecuteToolsNode::new(executor, catalog.clone())))
        .add_node("validate", Arc::new(ValidateNode::new(catalog)))
        .add_node("respond", Arc::new(RespondNode))
        .add_node("error", Arc::new(ErrorNode));

    graph
        .add_edge(START, "plan")
        .add_edge("plan", "think")
        .add_conditional_edges("think", Arc::new(think_route), None)
        .add_edge("execute_tools", "validate")
        .add_conditional_edges("validate", Arc::new(validate_route), None)
        .add_edge("respond", END)
        .add_edge("error", END);

    graph.with_middleware(Arc::new(crate::graph::LoggingNodeMiddleware)).compile()
}
