//! Query endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /query - answer a question from the indexed corpus
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let response = state.orchestrator().handle(request).await?;

    tracing::info!(
        "Query completed in {}ms ({} sources)",
        response.timings_ms.total,
        response.sources.len()
    );

    Ok(Json(response))
}
