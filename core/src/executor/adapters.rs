//! Adapter traits for the three external collaborators a catalog tool may
//! dispatch to, plus mock implementations (real adapters are out of scope).

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ToolExecutionError;

#[async_trait]
pub trait MlModelAdapter: Send + Sync {
    async fn predict(&self, model_id: Option<&str>, endpoint: Option<&str>, input_data: &Value) -> Result<Value, ToolExecutionError>;
}

#[async_trait]
pub trait DataWarehouseAdapter: Send + Sync {
    async fn query_template(&self, template: &str, args: &Value) -> Result<Value, ToolExecutionError>;
    async fn query_table(&self, table: &str, args: &Value) -> Result<Value, ToolExecutionError>;
}

#[async_trait]
pub trait ExternalApiAdapter: Send + Sync {
    async fn call(&self, url: &str, method: &str, headers: &std::collections::HashMap<String, String>, data: &Value) -> Result<Value, ToolExecutionError>;
}

/// Echoes back whatever it was asked to predict, tagged with the model/endpoint used.
#[derive(Default)]
pub struct MockMlModelAdapter;

#[async_trait]
impl MlModelAdapter for MockMlModelAdapter {
    async fn predict(&self, model_id: Option<&str>, endpoint: Option<&str>, input_data: &Value) -> Result<Value, ToolExecutionError> {
        Ok(json!({
            "model_id": model_id,
            "endpoint": endpoint,
            "prediction": input_data,
        }))
    }
}

/// Echoes back the template/table and args it was asked to query.
#[derive(Default)]
pub struct MockDataWarehouseAdapter;

#[async_trait]
impl DataWarehouseAdapter for MockDataWarehouseAdapter {
    async fn query_template(&self, template: &str, args: &Value) -> Result<Value, ToolExecutionError> {
        Ok(json!({"query_template": template, "args": args, "rows": []}))
    }

    async fn query_table(&self, table: &str, args: &Value) -> Result<Value, ToolExecutionError> {
        Ok(json!({"table": table, "args": args, "rows": []}))
    }
}

/// Echoes back the request it was asked to make.
#[derive(Default)]
pub struct MockExternalApiAdapter;

#[async_trait]
impl ExternalApiAdapter for MockExternalApiAdapter {
    async fn call(&self, url: &str, method: &str, headers: &std::collections::HashMap<String, String>, data: &Value) -> Result<Value, ToolExecutionError> {
        Ok(json!({"url": url, "method": method, "headers": headers, "body": data}))
    }
}
