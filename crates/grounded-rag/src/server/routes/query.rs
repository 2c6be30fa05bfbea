//! Query endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::time::{Duration, Instant};

use crate::error::ApiError;
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /api/query - Answer a question with its sources
pub async fn query_rag(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Some(service) = state.service() else {
        tracing::error!("Query received but the RAG core is not ready");
        return Err(ApiError::NotReady);
    };

    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!("Rejected query body: {}", rejection.body_text());
        ApiError::BadRequest("Invalid request format. Expected JSON.")
    })?;

    let query = request
        .query_text()
        .ok_or(ApiError::BadRequest("Missing 'query' in request body"))?;

    let start = Instant::now();
    let top_k = service.resolve_top_k(request.top_k);

    let deadline = Duration::from_secs(state.config().server.request_timeout_secs);
    let answer = tokio::time::timeout(deadline, service.ask(query, top_k))
        .await
        .map_err(|_| {
            tracing::error!("Query exceeded the {}s request deadline", deadline.as_secs());
            ApiError::Timeout
        })??;

    tracing::info!(
        "Answered query with {} sources in {}ms",
        answer.cited_sources.len(),
        start.elapsed().as_millis()
    );

    Ok(Json(answer.into()))
}
