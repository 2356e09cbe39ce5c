//! Respond node: terminal. Marks the run done without further state mutation.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::Next;
use crate::state::{AgentState, AgentStatus};
use crate::Node;

#[derive(Default)]
pub struct RespondNode;

#[async_trait]
impl Node<AgentState> for RespondNode {
    fn id(&self) -> &str {
        "respond"
    }

    async fn run(&self, mut state: AgentState) -> Result<(AgentState, Next), AgentError> {
        state.status = AgentStatus::Done;
        Ok((state, Next::End))
    }
}
