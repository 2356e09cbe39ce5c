//! Axum app: shared state and the `/chat` route.

use std::sync::Arc;

use axum::routing::post;
use axum::Router;

use orchestra_core::catalog::{Catalog, InMemoryCatalog};
use orchestra_core::conversation::{ConversationStore, MockConversationStore};
use orchestra_core::executor::ToolExecutor;
use orchestra_core::llm::ProviderGateway;

use super::chat::chat_handler;

/// Shared server state: the catalog (tools/skills/users), the provider
/// gateway (C1), the tool executor (C3) built over it, and the conversation
/// store (C5) turns are appended to at end-of-stream.
pub struct AppState {
    pub catalog: Arc<dyn Catalog>,
    pub gateway: Arc<ProviderGateway>,
    pub executor: Arc<ToolExecutor>,
    pub conversation_store: Arc<dyn ConversationStore>,
}

impl AppState {
    /// Builds state with an empty in-memory catalog and no configured
    /// providers; callers seed both via `catalog`/`gateway` before serving.
    pub fn new_empty() -> Self {
        let catalog: Arc<dyn Catalog> = Arc::new(InMemoryCatalog::new());
        let gateway = Arc::new(ProviderGateway::new(Vec::new()));
        let executor = Arc::new(ToolExecutor::new(catalog.clone()));
        let conversation_store: Arc<dyn ConversationStore> = Arc::new(MockConversationStore::new());
        Self { catalog, gateway, executor, conversation_store }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new().route("/chat", post(chat_handler)).with_state(state)
}
