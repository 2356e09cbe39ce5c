//! Catalog types: tools, skills, workflow nodes, and the users that may see
//! them. Backed by an in-memory registry seeded from `orch-config`.

mod registry;
mod rolling_stats;

pub use registry::{Catalog, InMemoryCatalog};
pub use rolling_stats::RollingStats;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Visibility level of a catalog object, checked by the permission filter (C6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Internal,
    Private,
}

/// A user evaluated against a catalog object's visibility by [`crate::permission::may`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub is_anonymous: bool,
    pub is_superuser: bool,
    pub department: Option<String>,
    pub roles: Vec<String>,
}

impl User {
    pub fn anonymous() -> Self {
        Self {
            is_anonymous: true,
            ..Default::default()
        }
    }
}

/// Anything the permission filter can evaluate: visibility plus owner/department/role gates.
pub trait Permissioned {
    fn visibility(&self) -> Visibility;
    fn created_by(&self) -> &str;
    fn allowed_departments(&self) -> &[String];
    fn allowed_roles(&self) -> &[String];
}

/// A tool's lifecycle stage. Dispatch and catalog lookup only honor `Active`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Draft,
    Active,
    Deprecated,
}

impl Default for ToolStatus {
    fn default() -> Self {
        ToolStatus::Active
    }
}

/// Which backend a tool dispatches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Calls a user-defined built-in handler (see `crate::executor::BuiltinTool`).
    Builtin,
    /// Calls a hosted ML model's predict endpoint.
    MlModel,
    /// Runs a parameterized query against a data warehouse.
    DataApi,
    /// Calls an arbitrary external HTTP API.
    ExternalApi,
}

/// Backend connection details for a non-builtin tool.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub model_id: Option<String>,
    pub endpoint: Option<String>,
    pub query_template: Option<String>,
    pub table_name: Option<String>,
    pub url: Option<String>,
    pub method: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// JSON-schema-ish description of a tool's parameters, sent to the provider
/// as part of the chat request and used to validate calls before dispatch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A callable tool registered in the catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tool {
    pub definition: ToolDefinition,
    pub kind: ToolKind,
    pub service_config: ServiceConfig,
    pub visibility: Visibility,
    pub created_by: String,
    #[serde(default)]
    pub allowed_departments: Vec<String>,
    #[serde(default)]
    pub allowed_roles: Vec<String>,
    #[serde(default)]
    pub stats: RollingStats,
    #[serde(default)]
    pub status: ToolStatus,
}

impl Tool {
    pub fn is_active(&self) -> bool {
        self.status == ToolStatus::Active
    }
}

impl Permissioned for Tool {
    fn visibility(&self) -> Visibility {
        self.visibility
    }
    fn created_by(&self) -> &str {
        &self.created_by
    }
    fn allowed_departments(&self) -> &[String] {
        &self.allowed_departments
    }
    fn allowed_roles(&self) -> &[String] {
        &self.allowed_roles
    }
}

/// One node in a skill's execution DAG.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    pub tool_name: String,
    /// Node ids this node depends on; must all complete before this one is ready.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Arguments for the tool call; values may contain `"$.path"` references
    /// resolved against the rolling context map (see `crate::dag::resolve_reference`).
    pub arguments: Value,
    /// Optional `"$.path"` expression; when present and it resolves to a
    /// falsy value (`false`, `null`, missing) the node is skipped rather than
    /// dispatched, and its context entry becomes `null`.
    #[serde(default)]
    pub condition: Option<String>,
}

/// A named, reusable DAG of tool calls.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub description: String,
    pub nodes: Vec<WorkflowNode>,
    /// Output key → `"$.path"` reference selecting which parts of the final
    /// context to return, and under what name.
    #[serde(default)]
    pub output_mapping: Vec<(String, String)>,
    pub visibility: Visibility,
    pub created_by: String,
    #[serde(default)]
    pub allowed_departments: Vec<String>,
    #[serde(default)]
    pub allowed_roles: Vec<String>,
}

impl Permissioned for Skill {
    fn visibility(&self) -> Visibility {
        self.visibility
    }
    fn created_by(&self) -> &str {
        &self.created_by
    }
    fn allowed_departments(&self) -> &[String] {
        &self.allowed_departments
    }
    fn allowed_roles(&self) -> &[String] {
        &self.allowed_roles
    }
}
