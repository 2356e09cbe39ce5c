//! Execute-tools node: runs every pending tool call through C3, in
//! server-provided order, appending one tool-role message per call.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::catalog::{Catalog, User};
use crate::error::AgentError;
use crate::executor::ToolExecutor;
use crate::graph::{Next, RunContext};
use crate::message::Message;
use crate::permission::may;
use crate::state::{AgentState, AgentStatus};
use crate::Node;

pub struct ExecuteToolsNode {
    executor: Arc<ToolExecutor>,
    catalog: Arc<dyn Catalog>,
}

impl ExecuteToolsNode {
    pub fn new(executor: Arc<ToolExecutor>, catalog: Arc<dyn Catalog>) -> Self {
        Self { executor, catalog }
    }
}

#[async_trait]
impl Node<AgentState> for ExecuteToolsNode {
    fn id(&self) -> &str {
        "execute_tools"
    }

    async fn run(&self, state: AgentState) -> Result<(AgentState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }

    async fn run_with_context(
        &self,
        mut state: AgentState,
        ctx: &RunContext<AgentState>,
    ) -> Result<(AgentState, Next), AgentError> {
        let session_id = state.session_id.clone();
        let user_id = state.user_id.clone();

        let user = match &user_id {
            Some(id) => User { id: id.clone(), ..Default::default() },
            None => User::anonymous(),
        };

        let calls = std::mem::take(&mut state.pending_tool_calls);
        for call in calls {
            let call_id = call.id.clone().unwrap_or_default();

            if let Some(tool) = self.catalog.get_tool(&call.name) {
                if !may(&user, &tool) {
                    state.messages.push(Message::tool_result(
                        call_id,
                        call.name.clone(),
                        "Error: forbidden".to_string(),
                    ));
                    continue;
                }
            }

            let args: Value = serde_json::from_str(&call.arguments).unwrap_or(Value::Object(Default::default()));
            let content = match self.executor.execute(&session_id, ctx.user_id().or(user_id.as_deref()), &call.name, args).await {
                Ok(value) => serde_json::to_string(&value).unwrap_or_else(|_| value.to_string()),
                Err(e) => format!("Error: {e}"),
            };

            state.messages.push(Message::tool_result(call_id, call.name.clone(), content));
        }

        state.status = AgentStatus::Validating;
        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::state::ToolCall;
    use crate::tools::CalculatorTool;

    #[tokio::test]
    async fn appends_tool_result_messages_in_order() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let mut executor = ToolExecutor::new(catalog.clone());
        executor.register_builtin(Arc::new(CalculatorTool));
        let node = ExecuteToolsNode::new(Arc::new(executor), catalog);

        let mut state = AgentState::new("s1", "add", "gpt-4o");
        state.pending_tool_calls = vec![ToolCall {
            id: Some("call_1".into()),
            name: "calculator".into(),
            arguments: "{\"a\":128,\"b\":355}".into(),
        }];

        let (new_state, _) = node.run(state).await.unwrap();
        assert!(new_state.pending_tool_calls.is_empty());
        assert_eq!(new_state.status, AgentStatus::Validating);
        let tool_msg = new_state.messages.last().unwrap();
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert!(tool_msg.content.contains("483"));
    }
}
