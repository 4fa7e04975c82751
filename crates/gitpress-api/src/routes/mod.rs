//! API routes.

pub mod hooks;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::AppState;

/// Build the main router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .nest("/hooks", hooks::router())
        .with_state(state)
}

async fn index() -> &'static str {
    "welcome to gitpress"
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
