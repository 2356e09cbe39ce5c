//! [`NodeMiddleware`] that traces node start/completion/error.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::logging::{log_node_complete, log_node_start};
use crate::graph::next::Next;
use crate::graph::node_middleware::NodeMiddleware;

/// Wraps every node run with `tracing` spans; logs start, completion, and errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNodeMiddleware;

#[async_trait]
impl<S> NodeMiddleware<S> for LoggingNodeMiddleware
where
    S: Send + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: Box<dyn FnOnce(S) -> Pin<Box<dyn Future<Output = Result<(S, Next), AgentError>> + Send>> + Send>,
    ) -> Result<(S, Next), AgentError> {
        log_node_start(node_id);
        let result = inner(state).await;
        match &result {
            Ok(_) => log_node_complete(node_id),
            Err(e) => tracing::error!(node_id, error = %e, "node failed"),
        }
        result
    }
}
