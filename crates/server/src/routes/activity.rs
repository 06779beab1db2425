//! Activity log page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use crate::db::ActivityLogRepository;
use crate::error::AppError;
use crate::forms::empty_string_as_none;
use crate::middleware::RequireAdmin;
use crate::models::ActivityPage;
use crate::routes::AdminView;
use crate::state::AppState;

pub const PER_PAGE: u32 = 20;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    #[serde(deserialize_with = "empty_string_as_none")]
    pub page: Option<u32>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/activity.html")]
pub struct ActivityTemplate {
    pub admin: AdminView,
    pub current_path: String,
    pub log: ActivityPage,
}

#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<ActivityTemplate, AppError> {
    let log = ActivityLogRepository::new(state.pool())
        .page(query.page.unwrap_or(1), PER_PAGE)
        .await?;

    Ok(ActivityTemplate {
        admin: AdminView::from(&admin),
        current_path: "/admin/activity".to_string(),
        log,
    })
}
