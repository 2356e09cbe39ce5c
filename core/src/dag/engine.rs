//! Run phase: executes a skill's workflow levels, a level at a time, with
//! bounded concurrency within each level.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Semaphore;

use crate::catalog::{Catalog, Skill, User, WorkflowNode};
use crate::error::AgentError;
use crate::executor::ToolExecutor;
use crate::permission::may;

use super::leveling::compute_levels;
use super::reference::resolve_reference;

/// Default bound on concurrent task execution within one level.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Runs every node of `skill`'s workflow to completion and projects the
/// result per `skill.output_mapping`.
///
/// Node failures are captured as `{"error": message}` in the context rather
/// than aborting the level; later levels see them via reference resolution.
pub async fn run_skill(
    skill: &Skill,
    input: Value,
    executor: &ToolExecutor,
    session_id: &str,
    user_id: Option<&str>,
) -> Result<Value, AgentError> {
    run_skill_with_concurrency(skill, input, executor, session_id, user_id, DEFAULT_MAX_CONCURRENCY).await
}

pub async fn run_skill_with_concurrency(
    skill: &Skill,
    input: Value,
    executor: &ToolExecutor,
    session_id: &str,
    user_id: Option<&str>,
    max_concurrency: usize,
) -> Result<Value, AgentError> {
    let levels = compute_levels(&skill.nodes)?;
    let nodes_by_id: HashMap<String, &WorkflowNode> = skill.nodes.iter().map(|n| (n.id.clone(), n)).collect();

    let user = match user_id {
        Some(id) => User { id: id.to_string(), ..Default::default() },
        None => User::anonymous(),
    };

    let mut context: HashMap<String, Value> = HashMap::new();
    context.insert("input".to_string(), input);

    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));

    for level in levels {
        let mut handles = Vec::new();
        for node_id in &level {
            let node = nodes_by_id[node_id];

            if let Some(condition) = &node.condition {
                let resolved = resolve_reference(&json!(condition), &context);
                if is_falsy(&resolved) {
                    context.insert(node.id.clone(), Value::Null);
                    continue;
                }
            }

            // `get_tool` already excludes non-active entries; a tool absent
            // from the catalog (e.g. a built-in) is allowed through, mirroring
            // `execute_tools_node`'s permission check for the ReAct loop.
            if let Some(tool) = executor.catalog().get_tool(&node.tool_name) {
                if !may(&user, &tool) {
                    context.insert(node.id.clone(), json!({ "error": "forbidden" }));
                    continue;
                }
            }

            let args = resolve_reference(&node.arguments, &context);
            let permit = semaphore.clone().acquire_owned().await.expect("semaphore not closed");
            let tool_name = node.tool_name.clone();
            let node_id = node.id.clone();
            let session_id = session_id.to_string();
            let user_id = user_id.map(String::from);

            // executor is borrowed for the whole run; tasks stay within this
            // function's lifetime via a scoped join rather than tokio::spawn,
            // since ToolExecutor is not required to be 'static here.
            handles.push(async move {
                let _permit = permit;
                let result = executor.execute(&session_id, user_id.as_deref(), &tool_name, args).await;
                let value = match result {
                    Ok(v) => v,
                    Err(e) => json!({ "error": e.to_string() }),
                };
                (node_id, value)
            });
        }

        let outcomes = futures::future::join_all(handles).await;
        for (node_id, value) in outcomes {
            context.insert(node_id, value);
        }
    }

    Ok(project_output(skill, &context))
}

/// A node's `condition` is treated as falsy when it resolves to `false`,
/// `null`, or is missing from the context altogether.
fn is_falsy(value: &Value) -> bool {
    matches!(value, Value::Null) || value == &Value::Bool(false)
}

fn project_output(skill: &Skill, context: &HashMap<String, Value>) -> Value {
    if skill.output_mapping.is_empty() {
        return json!(context);
    }
    let mut out = serde_json::Map::new();
    for (key, reference) in &skill.output_mapping {
        let resolved = resolve_reference(&json!(reference), context);
        out.insert(key.clone(), resolved);
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InMemoryCatalog, ServiceConfig, Tool, ToolDefinition, ToolKind, Visibility};
    use std::sync::Arc as StdArc;

    fn echo_tool(name: &str) -> Tool {
        Tool {
            definition: ToolDefinition { name: name.into(), description: String::new(), parameters: json!({}) },
            kind: ToolKind::Builtin,
            service_config: ServiceConfig::default(),
            visibility: Visibility::Public,
            created_by: "system".into(),
            allowed_departments: vec![],
            allowed_roles: vec![],
            stats: Default::default(),
            status: crate::catalog::ToolStatus::Active,
        }
    }

    fn node(id: &str, depends_on: &[&str], arguments: Value) -> WorkflowNode {
        WorkflowNode {
            id: id.to_string(),
            tool_name: id.to_string(),
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
            arguments,
            condition: None,
        }
    }

    #[tokio::test]
    async fn two_node_chain_s1_then_s2_resolves_reference() {
        let catalog = StdArc::new(InMemoryCatalog::new());
        catalog.insert_tool(echo_tool("s1"));
        catalog.insert_tool(echo_tool("s2"));
        let executor = ToolExecutor::new(catalog);

        let skill = Skill {
            id: "two_step".into(),
            name: "two_step".into(),
            description: String::new(),
            nodes: vec![
                node("s1", &[], json!({"value": 1})),
                node("s2", &["s1"], json!({"prior": "$.s1.input"})),
            ],
            output_mapping: vec![("result".to_string(), "$.s2".to_string())],
            visibility: Visibility::Public,
            created_by: "system".into(),
            allowed_departments: vec![],
            allowed_roles: vec![],
        };

        let result = run_skill(&skill, json!({}), &executor, "sess", None).await.unwrap();
        let s2 = &result["result"];
        assert_eq!(s2["input"]["prior"]["value"], 1);
    }

    #[tokio::test]
    async fn output_mapping_names_the_projected_key_distinctly_from_its_reference() {
        let catalog = StdArc::new(InMemoryCatalog::new());
        catalog.insert_tool(echo_tool("s1"));
        catalog.insert_tool(echo_tool("s2"));
        let executor = ToolExecutor::new(catalog);

        let skill = Skill {
            id: "scored".into(),
            name: "scored".into(),
            description: String::new(),
            nodes: vec![
                node("s1", &[], json!({"score": 0.9})),
                node("s2", &["s1"], json!({"prior": "$.s1.input"})),
            ],
            output_mapping: vec![("result".to_string(), "$.s2.input.prior.score".to_string())],
            visibility: Visibility::Public,
            created_by: "system".into(),
            allowed_departments: vec![],
            allowed_roles: vec![],
        };

        let result = run_skill(&skill, json!({}), &executor, "sess", None).await.unwrap();
        assert_eq!(result, json!({"result": 0.9}));
    }

    #[tokio::test]
    async fn missing_output_mapping_returns_whole_context() {
        let catalog = StdArc::new(InMemoryCatalog::new());
        catalog.insert_tool(echo_tool("s1"));
        let executor = ToolExecutor::new(catalog);
        let skill = Skill {
            id: "one_step".into(),
            name: "one_step".into(),
            description: String::new(),
            nodes: vec![node("s1", &[], json!({}))],
            output_mapping: vec![],
            visibility: Visibility::Public,
            created_by: "system".into(),
            allowed_departments: vec![],
            allowed_roles: vec![],
        };
        let result = run_skill(&skill, json!({"q": "hi"}), &executor, "sess", None).await.unwrap();
        assert_eq!(result["input"]["q"], "hi");
        assert!(result.get("s1").is_some());
    }

    #[tokio::test]
    async fn node_without_permission_is_not_dispatched() {
        let catalog = StdArc::new(InMemoryCatalog::new());
        let mut private_tool = echo_tool("s1");
        private_tool.visibility = Visibility::Private;
        private_tool.created_by = "alice".into();
        catalog.insert_tool(private_tool);
        let executor = ToolExecutor::new(catalog);

        let skill = Skill {
            id: "gated".into(),
            name: "gated".into(),
            description: String::new(),
            nodes: vec![node("s1", &[], json!({}))],
            output_mapping: vec![],
            visibility: Visibility::Public,
            created_by: "system".into(),
            allowed_departments: vec![],
            allowed_roles: vec![],
        };

        let result = run_skill(&skill, json!({}), &executor, "sess", Some("bob")).await.unwrap();
        assert_eq!(result["s1"]["error"], "forbidden");
    }

    #[tokio::test]
    async fn conditional_node_is_skipped_when_its_reference_is_falsy() {
        let catalog = StdArc::new(InMemoryCatalog::new());
        catalog.insert_tool(echo_tool("s1"));
        catalog.insert_tool(echo_tool("s2"));
        let executor = ToolExecutor::new(catalog);

        let mut gated = node("s2", &["s1"], json!({}));
        gated.condition = Some("$.s1.input.run_s2".to_string());

        let skill = Skill {
            id: "conditional".into(),
            name: "conditional".into(),
            description: String::new(),
            nodes: vec![node("s1", &[], json!({"run_s2": false})), gated],
            output_mapping: vec![],
            visibility: Visibility::Public,
            created_by: "system".into(),
            allowed_departments: vec![],
            allowed_roles: vec![],
        };

        let result = run_skill(&skill, json!({}), &executor, "sess", None).await.unwrap();
        assert_eq!(result["s2"], Value::Null);
    }
}
