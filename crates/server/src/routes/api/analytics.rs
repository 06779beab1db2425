//! Analytics summary and chart series.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use vitrine_core::{AgencyId, AgentId, TenantRef};

use crate::error::AppError;
use crate::forms::empty_string_as_none;
use crate::middleware::RequireAdmin;
use crate::services::analytics::{self, AnalyticsReport, Range};
use crate::state::AppState;

/// `?range=7d[&agentId=|&agencyId=]`, shared with the analytics page.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyticsQuery {
    #[serde(deserialize_with = "empty_string_as_none")]
    pub range: Option<Range>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub agent_id: Option<i32>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub agency_id: Option<i32>,
}

impl AnalyticsQuery {
    /// The tenant filter, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` when both ids are given.
    pub fn tenant(&self) -> Result<Option<TenantRef>, AppError> {
        match (self.agent_id, self.agency_id) {
            (None, None) => Ok(None),
            (agent, agency) => TenantRef::from_parts(
                agent.map(AgentId::new),
                agency.map(AgencyId::new),
            )
            .map(Some)
            .ok_or_else(|| AppError::BadRequest("pick an agent or an agency, not both".to_string())),
        }
    }
}

#[instrument(skip(_admin, state))]
pub async fn report(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsReport>, AppError> {
    let tenant = query.tenant()?;
    let range = query.range.unwrap_or_default();

    let report = analytics::report(state.pool(), range, tenant, Utc::now()).await?;
    Ok(Json(report))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_with_blank_selects() {
        let query: AnalyticsQuery =
            serde_urlencoded::from_str("range=30d&agentId=&agencyId=").unwrap();
        assert_eq!(query.range, Some(Range::D30));
        assert_eq!(query.tenant().unwrap(), None);
    }

    #[test]
    fn test_query_rejects_both_ids() {
        let query: AnalyticsQuery = serde_urlencoded::from_str("agentId=1&agencyId=2").unwrap();
        assert!(matches!(query.tenant(), Err(AppError::BadRequest(_))));

        let query: AnalyticsQuery = serde_urlencoded::from_str("agencyId=2").unwrap();
        assert_eq!(
            query.tenant().unwrap(),
            Some(TenantRef::Agency(AgencyId::new(2)))
        );
    }
}
