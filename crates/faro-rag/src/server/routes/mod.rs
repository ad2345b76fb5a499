//! API routes for the query server

pub mod metrics;
pub mod query;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/query", post(query::query))
        .route("/metrics", get(metrics::metrics))
}
