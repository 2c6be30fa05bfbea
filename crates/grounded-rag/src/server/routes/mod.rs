//! API routes for the query server

pub mod query;

use axum::{extract::State, routing::{get, post}, Json, Router};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/query", post(query::query_rag))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<Value> {
    let stats = state.service().map(|service| service.stats());

    Json(json!({
        "name": "grounded-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Grounded question answering over a pre-built vector index",
        "ready": state.is_ready(),
        "endpoints": {
            "POST /api/query": "Answer a question from the indexed documents",
            "GET /api/info": "Service information",
            "GET /health": "Liveness check",
            "GET /ready": "Readiness check"
        },
        "stats": stats,
    }))
}
