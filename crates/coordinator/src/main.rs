use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    extract::{Path, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use shared::{domain::SessionId, protocol::HealthResponse};
use tracing::info;

mod config;
mod script;
mod session;

use config::load_settings;
use script::Pacing;
use session::{run_session, SessionRegistry};

#[derive(Clone)]
struct AppState {
    sessions: SessionRegistry,
    pacing: Pacing,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let state = AppState {
        sessions: SessionRegistry::default(),
        pacing: settings.pacing(),
    };
    let app = build_router(state);

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {:?}", settings.bind_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "coordinator listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws/sprint/:session_id", get(ws_handler))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session_id = SessionId(session_id);
    ws.on_upgrade(move |socket| run_session(socket, session_id, state.sessions, state.pacing))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
