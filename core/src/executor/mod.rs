//! Tool executor (C3): dispatches one named tool call to a built-in handler,
//! or to an ML/data/external adapter selected by the catalog entry's kind,
//! updating rolling statistics on every outcome.

mod adapters;

pub use adapters::{
    DataWarehouseAdapter, ExternalApiAdapter, MlModelAdapter, MockDataWarehouseAdapter,
    MockExternalApiAdapter, MockMlModelAdapter,
};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};

use crate::catalog::{Catalog, ToolKind};
use crate::error::ToolExecutionError;
use crate::tool_source::ToolCallContext;
use crate::tools::BuiltinTool;

/// Executes tool calls by name: built-in handlers first, then catalog-backed
/// dispatch by tool kind, recording rolling stats on the catalog entry (when
/// one exists) after every call.
pub struct ToolExecutor {
    builtins: HashMap<String, Arc<dyn BuiltinTool>>,
    catalog: Arc<dyn Catalog>,
    ml_adapter: Arc<dyn MlModelAdapter>,
    warehouse_adapter: Arc<dyn DataWarehouseAdapter>,
    external_adapter: Arc<dyn ExternalApiAdapter>,
}

impl ToolExecutor {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            builtins: HashMap::new(),
            catalog,
            ml_adapter: Arc::new(MockMlModelAdapter),
            warehouse_adapter: Arc::new(MockDataWarehouseAdapter),
            external_adapter: Arc::new(MockExternalApiAdapter),
        }
    }

    pub fn register_builtin(&mut self, tool: Arc<dyn BuiltinTool>) {
        self.builtins.insert(tool.name().to_string(), tool);
    }

    /// The catalog this executor dispatches non-builtin tool calls against.
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Executes `name(args)` for `session_id`/`user_id`, per the dispatch
    /// order in `crate::catalog`'s module docs: built-in map, then catalog
    /// lookup dispatched by kind, falling back to a generic echo response for
    /// `builtin`-kind or unknown-kind catalog entries.
    pub async fn execute(
        &self,
        session_id: &str,
        user_id: Option<&str>,
        name: &str,
        args: Value,
    ) -> Result<Value, ToolExecutionError> {
        let start = Instant::now();
        let result = self.dispatch(session_id, user_id, name, &args).await;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.catalog.record_tool_call(name, latency_ms, result.is_ok());
        result
    }

    async fn dispatch(
        &self,
        session_id: &str,
        user_id: Option<&str>,
        name: &str,
        args: &Value,
    ) -> Result<Value, ToolExecutionError> {
        if let Some(tool) = self.builtins.get(name) {
            let ctx = ToolCallContext {
                recent_messages: Vec::new(),
                stream_writer: None,
                thread_id: Some(session_id.to_string()),
                user_id: user_id.map(String::from),
            };
            return tool
                .call(args.clone(), Some(&ctx))
                .await
                .map(|content| serde_json::from_str(&content.text).unwrap_or(Value::String(content.text)))
                .map_err(|e| ToolExecutionError {
                    tool_name: name.to_string(),
                    message: e.to_string(),
                });
        }

        let Some(tool) = self.catalog.get_tool(name) else {
            return Err(ToolExecutionError {
                tool_name: name.to_string(),
                message: "not found".to_string(),
            });
        };

        match tool.kind {
            ToolKind::MlModel => {
                let model_id = tool.service_config.model_id.as_deref();
                let endpoint = tool.service_config.endpoint.as_deref();
                if model_id.is_none() && endpoint.is_none() {
                    return Err(ToolExecutionError {
                        tool_name: name.to_string(),
                        message: "ml_model tool missing model_id/endpoint".to_string(),
                    });
                }
                self.ml_adapter
                    .predict(model_id, endpoint, args)
                    .await
                    .map_err(|e| ToolExecutionError { tool_name: name.to_string(), message: e.to_string() })
            }
            ToolKind::DataApi => {
                if let Some(template) = &tool.service_config.query_template {
                    self.warehouse_adapter
                        .query_template(template, args)
                        .await
                        .map_err(|e| ToolExecutionError { tool_name: name.to_string(), message: e.to_string() })
                } else if let Some(table) = &tool.service_config.table_name {
                    self.warehouse_adapter
                        .query_table(table, args)
                        .await
                        .map_err(|e| ToolExecutionError { tool_name: name.to_string(), message: e.to_string() })
                } else {
                    Err(ToolExecutionError {
                        tool_name: name.to_string(),
                        message: "data_api tool missing query_template/table_name".to_string(),
                    })
                }
            }
            ToolKind::ExternalApi => {
                let Some(url) = &tool.service_config.url else {
                    return Err(ToolExecutionError {
                        tool_name: name.to_string(),
                        message: "external_api tool missing url".to_string(),
                    });
                };
                let method = tool.service_config.method.as_deref().unwrap_or("POST");
                self.external_adapter
                    .call(url, method, &tool.service_config.headers, args)
                    .await
                    .map_err(|e| ToolExecutionError { tool_name: name.to_string(), message: e.to_string() })
            }
            ToolKind::Builtin => Ok(json!({
                "tool": name,
                "status": "executed",
                "input": args,
                "message": "Generic tool execution",
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InMemoryCatalog, ServiceConfig, Tool, ToolDefinition, Visibility};
    use crate::tools::CalculatorTool;

    fn catalog_tool(name: &str, kind: ToolKind, service_config: ServiceConfig) -> Tool {
        Tool {
            definition: ToolDefinition { name: name.into(), description: String::new(), parameters: json!({}) },
            kind,
            service_config,
            visibility: Visibility::Public,
            created_by: "system".into(),
            allowed_departments: vec![],
            allowed_roles: vec![],
            stats: Default::default(),
            status: crate::catalog::ToolStatus::Active,
        }
    }

    #[tokio::test]
    async fn builtin_map_takes_priority_over_catalog() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let mut executor = ToolExecutor::new(catalog);
        executor.register_builtin(Arc::new(CalculatorTool));
        let result = executor
            .execute("s1", None, "calculator", json!({"a": 128, "b": 355}))
            .await
            .unwrap();
        assert_eq!(result["sum"], 483.0);
    }

    #[tokio::test]
    async fn unknown_tool_name_is_not_found() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let executor = ToolExecutor::new(catalog);
        let err = executor.execute("s1", None, "missing", json!({})).await.unwrap_err();
        assert_eq!(err.message, "not found");
    }

    #[tokio::test]
    async fn deprecated_catalog_entry_dispatches_as_not_found() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let mut tool = catalog_tool("retired", ToolKind::Builtin, ServiceConfig::default());
        tool.status = crate::catalog::ToolStatus::Deprecated;
        catalog.insert_tool(tool);
        let executor = ToolExecutor::new(catalog);
        let err = executor.execute("s1", None, "retired", json!({})).await.unwrap_err();
        assert_eq!(err.message, "not found");
    }

    #[tokio::test]
    async fn builtin_kind_catalog_entry_falls_back_to_echo() {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.insert_tool(catalog_tool("echo_tool", ToolKind::Builtin, ServiceConfig::default()));
        let executor = ToolExecutor::new(catalog);
        let result = executor.execute("s1", None, "echo_tool", json!({"x": 1})).await.unwrap();
        assert_eq!(result["status"], "executed");
    }

    #[tokio::test]
    async fn execution_updates_rolling_stats_on_catalog_entry() {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.insert_tool(catalog_tool("echo_tool", ToolKind::Builtin, ServiceConfig::default()));
        let catalog_dyn: Arc<dyn Catalog> = catalog.clone();
        let executor = ToolExecutor::new(catalog_dyn);
        executor.execute("s1", None, "echo_tool", json!({})).await.unwrap();
        let tool = catalog.get_tool("echo_tool").unwrap();
        assert_eq!(tool.stats.call_count, 1);
    }

    #[tokio::test]
    async fn ml_model_tool_missing_model_id_and_endpoint_errors() {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.insert_tool(catalog_tool("predictor", ToolKind::MlModel, ServiceConfig::default()));
        let executor = ToolExecutor::new(catalog);
        let err = executor.execute("s1", None, "predictor", json!({})).await.unwrap_err();
        assert!(err.message.contains("model_id"));
    }
}
