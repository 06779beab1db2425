//! Visit counting.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use vitrine_core::{AgencyId, AgentId, TenantRef};

use crate::db::{AnalyticsRepository, RepositoryError};
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::VisitRecord;
use crate::state::AppState;

/// Body posted by `track-visit.js`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackVisitRequest {
    pub agent_id: Option<i32>,
    pub agency_id: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct TrackVisitResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visits: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn failure(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(TrackVisitResponse {
            success: false,
            visits: None,
            error: Some(error.to_string()),
        }),
    )
        .into_response()
}

/// Count one visit for today (UTC).
#[instrument(skip(state, body))]
pub async fn track_visit(
    State(state): State<AppState>,
    body: Result<Json<TrackVisitRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return failure(StatusCode::BAD_REQUEST, "Invalid JSON body");
    };

    let Some(tenant) = TenantRef::from_parts(
        body.agent_id.map(AgentId::new),
        body.agency_id.map(AgencyId::new),
    ) else {
        return failure(
            StatusCode::BAD_REQUEST,
            "Exactly one of agentId or agencyId is required",
        );
    };

    let today = Utc::now().date_naive();
    match AnalyticsRepository::new(state.pool())
        .record_visit(tenant, today)
        .await
    {
        Ok(visits) => {
            tracing::debug!(tenant = %tenant, visits, "Visit recorded");
            Json(TrackVisitResponse {
                success: true,
                visits: Some(visits),
                error: None,
            })
            .into_response()
        }
        Err(RepositoryError::NotFound) => failure(StatusCode::NOT_FOUND, "Unknown tenant"),
        Err(e) => {
            tracing::error!(tenant = %tenant, error = %e, "Failed to record visit");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to record visit")
        }
    }
}

/// Today's raw counters.
#[instrument(skip(_admin, state))]
pub async fn stats(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<VisitRecord>>, AppError> {
    let today = Utc::now().date_naive();
    let rows = AnalyticsRepository::new(state.pool()).for_day(today).await?;
    Ok(Json(rows))
}
