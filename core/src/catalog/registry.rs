//! In-memory tool/skill registry.

use dashmap::DashMap;

use crate::catalog::{Skill, Tool};

/// Read/write access to the tool and skill catalog.
///
/// The only mutation the engine performs at runtime is rolling-stats updates
/// after a tool call; everything else is seeded once at startup from
/// `orch-config`.
pub trait Catalog: Send + Sync {
    fn get_tool(&self, name: &str) -> Option<Tool>;
    fn get_skill(&self, name: &str) -> Option<Skill>;
    fn list_tools(&self) -> Vec<Tool>;
    fn list_skills(&self) -> Vec<Skill>;
    fn insert_tool(&self, tool: Tool);
    fn insert_skill(&self, skill: Skill);
    /// Folds one call's latency/success into the named tool's rolling stats.
    /// A missing tool is silently ignored: stats updates must never fail a call.
    fn record_tool_call(&self, name: &str, latency_ms: f64, success: bool);
}

/// `DashMap`-backed [`Catalog`]: concurrent reads and writes without a global lock,
/// tolerant of readers observing slightly stale stats mid-update.
#[derive(Default)]
pub struct InMemoryCatalog {
    tools: DashMap<String, Tool>,
    skills: DashMap<String, Skill>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Catalog for InMemoryCatalog {
    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tools.get(name).map(|r| r.clone()).filter(Tool::is_active)
    }

    fn get_skill(&self, name: &str) -> Option<Skill> {
        self.skills.get(name).map(|r| r.clone())
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|r| r.clone()).collect()
    }

    fn list_skills(&self) -> Vec<Skill> {
        self.skills.iter().map(|r| r.clone()).collect()
    }

    fn insert_tool(&self, tool: Tool) {
        self.tools.insert(tool.definition.name.clone(), tool);
    }

    fn insert_skill(&self, skill: Skill) {
        self.skills.insert(skill.name.clone(), skill);
    }

    fn record_tool_call(&self, name: &str, latency_ms: f64, success: bool) {
        if let Some(mut tool) = self.tools.get_mut(name) {
            tool.stats.record(latency_ms, success);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ServiceConfig, ToolDefinition, ToolKind, Visibility};

    fn sample_tool(name: &str) -> Tool {
        Tool {
            definition: ToolDefinition {
                name: name.to_string(),
                description: "test tool".into(),
                parameters: serde_json::json!({}),
            },
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

    #[test]
    fn insert_then_get_round_trips() {
        let catalog = InMemoryCatalog::new();
        catalog.insert_tool(sample_tool("calculator"));
        assert!(catalog.get_tool("calculator").is_some());
        assert!(catalog.get_tool("missing").is_none());
    }

    #[test]
    fn get_tool_hides_non_active_entries() {
        let catalog = InMemoryCatalog::new();
        let mut draft = sample_tool("draft_tool");
        draft.status = crate::catalog::ToolStatus::Draft;
        catalog.insert_tool(draft);
        let mut deprecated = sample_tool("deprecated_tool");
        deprecated.status = crate::catalog::ToolStatus::Deprecated;
        catalog.insert_tool(deprecated);

        assert!(catalog.get_tool("draft_tool").is_none());
        assert!(catalog.get_tool("deprecated_tool").is_none());
    }

    #[test]
    fn record_tool_call_updates_stats() {
        let catalog = InMemoryCatalog::new();
        catalog.insert_tool(sample_tool("calculator"));
        catalog.record_tool_call("calculator", 50.0, true);
        let tool = catalog.get_tool("calculator").unwrap();
        assert_eq!(tool.stats.call_count, 1);
        assert_eq!(tool.stats.avg_latency_ms, 50.0);
    }

    #[test]
    fn record_tool_call_on_unknown_tool_is_noop() {
        let catalog = InMemoryCatalog::new();
        catalog.record_tool_call("missing", 1.0, true);
    }
}
