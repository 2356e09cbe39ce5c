//! Builds the catalog and provider gateway the server starts with: the
//! calculator built-in registered as a public catalog tool, and provider
//! records read from the process environment (after `orch-config` applies
//! `.env`/XDG config over it).

use std::sync::Arc;

use orchestra_core::catalog::{Catalog, InMemoryCatalog, ServiceConfig, Tool, ToolDefinition, ToolKind, Visibility};
use orchestra_core::conversation::{ConversationStore, MockConversationStore};
use orchestra_core::executor::ToolExecutor;
use orchestra_core::llm::{ProviderGateway, ProviderRecord};
use orchestra_core::tools::{BuiltinTool, CalculatorTool};

use super::app::AppState;

const APP_NAME: &str = "orch";

/// One provider per supported env var, each only included when its API key
/// is set. Matches the provider kind strings `ProviderGateway` understands.
const ENV_PROVIDERS: &[(&str, &str, &str)] = &[
    ("OPENAI_API_KEY", "openai", "https://api.openai.com/v1"),
    ("DEEPSEEK_API_KEY", "deepseek", "https://api.deepseek.com/v1"),
    ("ANTHROPIC_API_KEY", "anthropic", "https://api.anthropic.com/v1"),
    ("QWEN_API_KEY", "qwen", "https://dashscope.aliyuncs.com/compatible-mode/v1"),
    ("MOONSHOT_API_KEY", "moonshot", "https://api.moonshot.cn/v1"),
];

fn provider_records_from_env() -> Vec<ProviderRecord> {
    ENV_PROVIDERS
        .iter()
        .filter_map(|(var, kind, base_url)| {
            let api_key = std::env::var(var).ok()?;
            Some(ProviderRecord {
                id: kind.to_string(),
                owner_id: None,
                kind: kind.to_string(),
                base_url: base_url.to_string(),
                api_key,
                enabled: true,
                models: Vec::new(),
            })
        })
        .collect()
}

fn calculator_catalog_entry() -> Tool {
    let spec = CalculatorTool.spec();
    Tool {
        definition: ToolDefinition {
            name: spec.name,
            description: spec.description.unwrap_or_default(),
            parameters: spec.input_schema,
        },
        kind: ToolKind::Builtin,
        service_config: ServiceConfig::default(),
        visibility: Visibility::Public,
        created_by: "system".to_string(),
        allowed_departments: Vec::new(),
        allowed_roles: Vec::new(),
        stats: Default::default(),
        status: orchestra_core::catalog::ToolStatus::Active,
    }
}

/// Builds server state: `.env`/XDG config applied to the environment, a
/// catalog seeded with the calculator built-in, and a gateway configured
/// from whichever provider API keys are present.
pub fn seeded_state_from_env() -> AppState {
    let _ = orch_config::load_and_apply(APP_NAME, None);

    let catalog: Arc<dyn Catalog> = Arc::new(InMemoryCatalog::new());
    catalog.insert_tool(calculator_catalog_entry());

    let mut executor = ToolExecutor::new(catalog.clone());
    executor.register_builtin(Arc::new(CalculatorTool) as Arc<dyn BuiltinTool + 'static>);

    let gateway = Arc::new(ProviderGateway::new(provider_records_from_env()));
    let conversation_store: Arc<dyn ConversationStore> = Arc::new(MockConversationStore::new());

    AppState { catalog, gateway, executor: Arc::new(executor), conversation_store }
}
