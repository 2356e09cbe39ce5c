//! Error node: terminal. Composes a user-facing error message from whatever
//! reasoning/validation state is available.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::Next;
use crate::state::{AgentState, AgentStatus};
use crate::Node;

#[derive(Default)]
pub struct ErrorNode;

#[async_trait]
impl Node<AgentState> for ErrorNode {
    fn id(&self) -> &str {
        "error"
    }

    async fn run(&self, mut state: AgentState) -> Result<(AgentState, Next), AgentError> {
        let detail = state
            .validation_issues
            .first()
            .map(|i| i.message.clone())
            .unwrap_or_else(|| "unknown error".to_string());
        state.final_response = Some(format!("An error occurred: {detail}"));
        state.status = AgentStatus::Error;
        Ok((state, Next::End))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn composes_final_response_from_first_issue() {
        let node = ErrorNode;
        let mut state = AgentState::new("s1", "hi", "gpt-4o");
        state.validation_issues.push(crate::state::ValidationIssue {
            kind: "shape".into(),
            message: "tool 'x' result missing expected key 'y'".into(),
        });
        let (new_state, next) = node.run(state).await.unwrap();
        assert_eq!(new_state.status, AgentStatus::Error);
        assert!(new_state.final_response.unwrap().contains("missing expected key"));
        assert_eq!(next, Next::End);
    }
}
