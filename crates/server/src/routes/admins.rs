//! Admin team page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use tracing::instrument;

use vitrine_core::AdminId;

use crate::db::AdminRepository;
use crate::error::AppError;
use crate::forms::AdminForm;
use crate::middleware::RequireAdmin;
use crate::models::Admin;
use crate::routes::{AdminView, Flash, redirect_error, redirect_success};
use crate::services::AdminService;
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "admin/admins/index.html")]
pub struct AdminsIndexTemplate {
    pub admin: AdminView,
    pub current_path: String,
    pub flash: Flash,
    pub current_admin_id: i32,
    pub admins: Vec<Admin>,
}

#[instrument(skip(admin, state, flash))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(flash): Query<Flash>,
) -> Result<AdminsIndexTemplate, AppError> {
    let admins = AdminRepository::new(state.pool()).list().await?;

    Ok(AdminsIndexTemplate {
        admin: AdminView::from(&admin),
        current_path: "/admin/admins".to_string(),
        flash,
        current_admin_id: admin.id.as_i32(),
        admins,
    })
}

#[instrument(skip(admin, state, form))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<AdminForm>,
) -> Redirect {
    match AdminService::new(&state).create(&admin.name, form).await {
        Ok(added) => redirect_success("/admin/admins", &format!("{} added", added.name)),
        Err(e) => redirect_error("/admin/admins", &e.to_string()),
    }
}

#[instrument(skip(admin, state))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Redirect {
    match AdminService::new(&state)
        .delete(&admin.name, AdminId::new(id))
        .await
    {
        Ok(removed) => redirect_success("/admin/admins", &format!("{} removed", removed.name)),
        Err(e) => redirect_error("/admin/admins", &e.to_string()),
    }
}
