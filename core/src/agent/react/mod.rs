//! ReAct agent loop (C2): `plan → think → (execute_tools → validate)* →
//! respond/error`, each a `Node<AgentState>`. See [`build_react_graph`] for
//! how they're wired into a compiled graph.

mod build;
mod error_node;
mod execute_tools_node;
mod plan_node;
mod respond_node;
mod think_node;
mod validate_node;

pub use build::build_react_graph;
pub use error_node::ErrorNode;
pub use execute_tools_node::ExecuteToolsNode;
pub use plan_node::PlanNode;
pub use respond_node::RespondNode;
pub use think_node::ThinkNode;
pub use validate_node::ValidateNode;
