//! Structured tracing around graph and node execution.

use std::fmt::Debug;

pub fn log_graph_start(thread_id: Option<&str>) {
    tracing::info!(thread_id, "graph run starting");
}

pub fn log_graph_complete(thread_id: Option<&str>, steps: i64) {
    tracing::info!(thread_id, steps, "graph run complete");
}

pub fn log_graph_error(thread_id: Option<&str>, error: &dyn std::error::Error) {
    tracing::error!(thread_id, error = %error, "graph run failed");
}

pub fn log_node_start(node_id: &str) {
    tracing::debug!(node_id, "node starting");
}

pub fn log_node_complete(node_id: &str) {
    tracing::debug!(node_id, "node complete");
}

pub fn log_state_update<S: Debug>(node_id: &str, state: &S) {
    tracing::trace!(node_id, state = ?state, "state updated");
}
