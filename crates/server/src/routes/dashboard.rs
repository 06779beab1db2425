//! Dashboard overview.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use chrono::Utc;
use tracing::instrument;

use crate::db::{
    ActivityLogRepository, AdminRepository, AgencyRepository, AgentRepository,
    AnalyticsRepository,
};
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::ActivityEntry;
use crate::routes::AdminView;
use crate::services::analytics::VisitSummary;
use crate::state::AppState;

const RECENT_ACTIVITY: u32 = 5;

#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub admin: AdminView,
    pub current_path: String,
    pub agent_count: i64,
    pub agency_count: i64,
    pub admin_count: i64,
    pub visits: VisitSummary,
    pub recent_activity: Vec<ActivityEntry>,
}

#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<DashboardTemplate, AppError> {
    let pool = state.pool();
    let agents = AgentRepository::new(pool);
    let agencies = AgencyRepository::new(pool);
    let admins = AdminRepository::new(pool);
    let analytics = AnalyticsRepository::new(pool);
    let activity = ActivityLogRepository::new(pool);

    let (agent_count, agency_count, admin_count, visits, recent) = tokio::try_join!(
        agents.count(),
        agencies.count(),
        admins.count(),
        analytics.list(None, None),
        activity.page(1, RECENT_ACTIVITY),
    )?;

    Ok(DashboardTemplate {
        admin: AdminView::from(&admin),
        current_path: "/admin".to_string(),
        agent_count,
        agency_count,
        admin_count,
        visits: VisitSummary::from_rows(&visits, Utc::now()),
        recent_activity: recent.entries,
    })
}
