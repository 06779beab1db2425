//! JSON endpoints under `/api`.

pub mod analytics;
pub mod visits;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/track-visit", post(visits::track_visit))
        .route("/stats", get(visits::stats))
        .route("/analytics", get(analytics::report))
}
