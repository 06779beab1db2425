//! Agency management pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use tracing::instrument;

use vitrine_core::{AgencyId, AgentId};

use crate::db::{AgencyRepository, AgentRepository};
use crate::error::AppError;
use crate::forms::AgencyForm;
use crate::middleware::RequireAdmin;
use crate::models::{Agency, AgencyListItem, AgencyMember};
use crate::routes::{AdminView, Flash, redirect_error, redirect_success};
use crate::services::{ActionError, AgencyService};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AgencyRow {
    pub item: AgencyListItem,
    pub site_url: String,
}

/// Manager choice in the agency form.
#[derive(Debug, Clone)]
pub struct ManagerOption {
    pub id: i32,
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AgencyFormValues {
    pub name: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub phone: String,
    pub email: String,
}

impl From<&Agency> for AgencyFormValues {
    fn from(agency: &Agency) -> Self {
        Self {
            name: agency.name.clone(),
            address: agency.address.clone(),
            city: agency.city.clone(),
            zip_code: agency.zip_code.clone(),
            phone: agency.phone.clone(),
            email: agency.email.to_string(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/agencies/index.html")]
pub struct AgenciesIndexTemplate {
    pub admin: AdminView,
    pub current_path: String,
    pub flash: Flash,
    pub agencies: Vec<AgencyRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/agencies/form.html")]
pub struct AgencyFormTemplate {
    pub admin: AdminView,
    pub current_path: String,
    pub flash: Flash,
    pub agency_id: Option<i32>,
    pub site_url: Option<String>,
    pub values: AgencyFormValues,
    pub managers: Vec<ManagerOption>,
    pub members: Vec<AgencyMember>,
}

async fn manager_options(
    state: &AppState,
    selected: Option<AgentId>,
) -> Result<Vec<ManagerOption>, AppError> {
    Ok(AgentRepository::new(state.pool())
        .list()
        .await?
        .into_iter()
        .map(|item| ManagerOption {
            id: item.agent.id.as_i32(),
            name: item.agent.full_name(),
            selected: selected == Some(item.agent.id),
        })
        .collect())
}

#[instrument(skip(admin, state, flash))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(flash): Query<Flash>,
) -> Result<AgenciesIndexTemplate, AppError> {
    let agencies = AgencyRepository::new(state.pool())
        .list()
        .await?
        .into_iter()
        .map(|item| AgencyRow {
            site_url: state.config().tenant_url(item.agency.slug.as_str()),
            item,
        })
        .collect();

    Ok(AgenciesIndexTemplate {
        admin: AdminView::from(&admin),
        current_path: "/admin/agencies".to_string(),
        flash,
        agencies,
    })
}

#[instrument(skip(admin, state, flash))]
pub async fn new(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(flash): Query<Flash>,
) -> Result<AgencyFormTemplate, AppError> {
    Ok(AgencyFormTemplate {
        admin: AdminView::from(&admin),
        current_path: "/admin/agencies".to_string(),
        flash,
        agency_id: None,
        site_url: None,
        values: AgencyFormValues::default(),
        managers: manager_options(&state, None).await?,
        members: Vec::new(),
    })
}

#[instrument(skip(admin, state, flash))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(flash): Query<Flash>,
) -> Result<AgencyFormTemplate, AppError> {
    let agency_id = AgencyId::new(id);
    let agency = AgencyRepository::new(state.pool())
        .get(agency_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("agency {id}")))?;
    let members = AgentRepository::new(state.pool())
        .list_by_agency(agency_id)
        .await?;

    Ok(AgencyFormTemplate {
        admin: AdminView::from(&admin),
        current_path: "/admin/agencies".to_string(),
        flash,
        agency_id: Some(id),
        site_url: Some(state.config().tenant_url(agency.slug.as_str())),
        values: AgencyFormValues::from(&agency),
        managers: manager_options(&state, agency.manager_id).await?,
        members,
    })
}

#[instrument(skip(admin, state, form))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<AgencyForm>,
) -> Redirect {
    match AgencyService::new(&state).create(&admin.name, form).await {
        Ok(agency) => redirect_success(
            "/admin/agencies",
            &format!("Agency {} created", agency.name),
        ),
        Err(e) => redirect_error("/admin/agencies/new", &e.to_string()),
    }
}

#[instrument(skip(admin, state, form))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<AgencyForm>,
) -> Redirect {
    match AgencyService::new(&state)
        .update(&admin.name, AgencyId::new(id), form)
        .await
    {
        Ok(agency) => redirect_success(
            "/admin/agencies",
            &format!("Agency {} updated", agency.name),
        ),
        Err(ActionError::NotFound) => redirect_error("/admin/agencies", "Agency not found"),
        Err(e) => redirect_error(&format!("/admin/agencies/{id}/edit"), &e.to_string()),
    }
}

#[instrument(skip(admin, state))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Redirect {
    match AgencyService::new(&state)
        .delete(&admin.name, AgencyId::new(id))
        .await
    {
        Ok(agency) => redirect_success(
            "/admin/agencies",
            &format!("Agency {} deleted", agency.name),
        ),
        Err(e) => redirect_error("/admin/agencies", &e.to_string()),
    }
}
