//! Topological leveling for a skill's workflow nodes, detecting cycles before
//! any task runs.

use std::collections::HashSet;

use crate::catalog::WorkflowNode;
use crate::error::AgentError;

/// Computes execution levels: repeatedly collects the set of not-yet-placed
/// nodes whose dependencies are all already placed, until every node is
/// placed. A round that places nothing while nodes remain indicates a cycle.
pub fn compute_levels(nodes: &[WorkflowNode]) -> Result<Vec<Vec<String>>, AgentError> {
    let mut remaining: Vec<&WorkflowNode> = nodes.iter().collect();
    let mut placed: HashSet<String> = HashSet::new();
    let mut levels = Vec::new();

    while !remaining.is_empty() {
        let (ready, not_ready): (Vec<_>, Vec<_>) = remaining
            .into_iter()
            .partition(|n| n.depends_on.iter().all(|d| placed.contains(d)));

        if ready.is_empty() {
            let cycle_ids = not_ready.iter().map(|n| n.id.clone()).collect();
            return Err(AgentError::DependencyCycle(cycle_ids));
        }

        let level: Vec<String> = ready.iter().map(|n| n.id.clone()).collect();
        for id in &level {
            placed.insert(id.clone());
        }
        levels.push(level);
        remaining = not_ready;
    }

    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: &str, depends_on: &[&str]) -> WorkflowNode {
        WorkflowNode {
            id: id.to_string(),
            tool_name: "noop".to_string(),
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
            arguments: json!({}),
            condition: None,
        }
    }

    #[test]
    fn linear_chain_produces_one_node_per_level() {
        let nodes = vec![node("s1", &[]), node("s2", &["s1"])];
        let levels = compute_levels(&nodes).unwrap();
        assert_eq!(levels, vec![vec!["s1".to_string()], vec!["s2".to_string()]]);
    }

    #[test]
    fn independent_nodes_share_a_level() {
        let nodes = vec![node("a", &[]), node("b", &[])];
        let levels = compute_levels(&nodes).unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].len(), 2);
    }

    #[test]
    fn cycle_is_rejected_before_running_anything() {
        let nodes = vec![node("a", &["b"]), node("b", &["a"])];
        let err = compute_levels(&nodes).unwrap_err();
        match err {
            AgentError::DependencyCycle(ids) => {
                assert_eq!(ids.len(), 2);
            }
            other => panic!("expected DependencyCycle, got {other:?}"),
        }
    }
}
