//! HTTP API server for browser extensions and other clients.
//!
//! `POST /ask` always answers 200 with `{"answer": ...}`; pipeline failures
//! arrive as the answer text.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{flatten, Orchestrator};
use axum::{
    extract::State,
    http::{request::Parts, HeaderValue},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::info;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Answer, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let allowed_origins = settings.server.allowed_origins.clone();

    let state = Arc::new(AppState {
        orchestrator: Orchestrator::new(settings)?,
    });
    let app = router(state, &allowed_origins);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("vidqa API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask", "POST /ask");
    Output::kv("Allowed origins", &allowed_origins.join(", "));
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask))
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

/// Exact origins, or prefixes when the pattern ends in `*`.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let patterns = allowed_origins.to_vec();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request: &Parts| {
                origin
                    .to_str()
                    .map(|origin| origin_allowed(&patterns, origin))
                    .unwrap_or(false)
            },
        ))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

fn origin_allowed(patterns: &[String], origin: &str) -> bool {
    patterns.iter().any(|pattern| match pattern.strip_suffix('*') {
        Some(prefix) => origin.starts_with(prefix),
        None => origin == pattern,
    })
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    video_id: String,
    #[serde(default)]
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> impl IntoResponse {
    let outcome = state
        .orchestrator
        .answer_question(&req.video_id, &req.question)
        .await;

    Json(AskResponse {
        answer: flatten(outcome),
    })
}
