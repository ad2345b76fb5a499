//! Search comparison metrics endpoint

use axum::{extract::State, Json};

use crate::metrics::MetricsSnapshot;
use crate::server::state::AppState;

/// GET /metrics - current search latency and overlap aggregates
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics().snapshot())
}
