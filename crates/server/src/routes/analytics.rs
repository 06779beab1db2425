//! Analytics page. The numbers refresh from `/api/analytics` every 30 s.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use chrono::Utc;
use tracing::instrument;

use crate::db::{AgencyRepository, AgentRepository};
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::routes::AdminView;
use crate::routes::api::analytics::AnalyticsQuery;
use crate::services::analytics::{self, AnalyticsReport, Range};
use crate::state::AppState;

/// Option in the range or tenant pickers.
#[derive(Debug, Clone)]
pub struct PickerOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/analytics.html")]
pub struct AnalyticsTemplate {
    pub admin: AdminView,
    pub current_path: String,
    pub ranges: Vec<PickerOption>,
    pub agents: Vec<PickerOption>,
    pub agencies: Vec<PickerOption>,
    pub report: AnalyticsReport,
}

#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<AnalyticsTemplate, AppError> {
    let tenant = query.tenant()?;
    let range = query.range.unwrap_or_default();

    let agent_repo = AgentRepository::new(state.pool());
    let agency_repo = AgencyRepository::new(state.pool());
    let (report, agents, agencies) = tokio::try_join!(
        analytics::report(state.pool(), range, tenant, Utc::now()),
        agent_repo.list(),
        agency_repo.list_options(),
    )?;

    let ranges = Range::ALL
        .iter()
        .map(|r| PickerOption {
            value: r.as_str().to_string(),
            label: r.label().to_string(),
            selected: *r == range,
        })
        .collect();
    let agents = agents
        .into_iter()
        .map(|item| PickerOption {
            value: item.agent.id.to_string(),
            label: item.agent.full_name(),
            selected: query.agent_id == Some(item.agent.id.as_i32()),
        })
        .collect();
    let agencies = agencies
        .into_iter()
        .map(|(id, name)| PickerOption {
            value: id.to_string(),
            label: name,
            selected: query.agency_id == Some(id.as_i32()),
        })
        .collect();

    Ok(AnalyticsTemplate {
        admin: AdminView::from(&admin),
        current_path: "/admin/analytics".to_string(),
        ranges,
        agents,
        agencies,
        report,
    })
}
