//! HTTP server exposing the orchestration engine's `/chat` SSE endpoint (axum).
//!
//! One route: `POST /chat` compiles the ReAct graph (C2) for a single turn,
//! runs it with streaming enabled, and streams back `thinking`/`tool_call`/
//! `tool_result`/`message`/`error`/`done` SSE frames (C5).
//!
//! **Public API**: [`run_serve`], [`run_serve_on_listener`].

mod app;
mod chat;
mod seed;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

pub use app::{router, AppState};
pub use chat::ChatRequest;

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Runs the server on an existing listener. Used by tests (bind to
/// `127.0.0.1:0`, then pass the listener in).
pub async fn run_serve_on_listener(
    listener: TcpListener,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("orch-serve listening on http://{}", addr);

    let state = Arc::new(seed::seeded_state_from_env());
    let app = router(state);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Runs the server. Listens on `addr` (default `127.0.0.1:8080`).
pub async fn run_serve(addr: Option<&str>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = addr.unwrap_or(DEFAULT_ADDR);
    let listener = TcpListener::bind(addr).await?;
    run_serve_on_listener(listener).await
}
