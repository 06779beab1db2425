//! Agent management pages.

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
use crate::forms::AgentForm;
use crate::middleware::RequireAdmin;
use crate::models::{Agent, AgentListItem};
use crate::routes::{AdminView, Flash, redirect_error, redirect_success};
use crate::services::{ActionError, AgentService};
use crate::state::AppState;

/// Row of the agents table.
#[derive(Debug, Clone)]
pub struct AgentRow {
    pub item: AgentListItem,
    pub site_url: String,
}

/// Agency choice in the agent form.
#[derive(Debug, Clone)]
pub struct AgencyOption {
    pub id: i32,
    pub name: String,
    pub selected: bool,
}

/// Current values of the agent form.
#[derive(Debug, Clone, Default)]
pub struct AgentFormValues {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub photo_url: String,
    pub city: String,
    pub zip_code: String,
    pub secondary_sector: String,
    pub facebook_url: String,
    pub instagram_url: String,
    pub linkedin_url: String,
    pub bio: String,
}

impl From<&Agent> for AgentFormValues {
    fn from(agent: &Agent) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            first_name: agent.first_name.clone(),
            last_name: agent.last_name.clone(),
            email: agent.email.to_string(),
            phone: agent.phone.clone(),
            photo_url: text(&agent.photo_url),
            city: agent.city.clone(),
            zip_code: agent.zip_code.clone(),
            secondary_sector: text(&agent.secondary_sector),
            facebook_url: text(&agent.facebook_url),
            instagram_url: text(&agent.instagram_url),
            linkedin_url: text(&agent.linkedin_url),
            bio: text(&agent.bio),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/agents/index.html")]
pub struct AgentsIndexTemplate {
    pub admin: AdminView,
    pub current_path: String,
    pub flash: Flash,
    pub agents: Vec<AgentRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/agents/form.html")]
pub struct AgentFormTemplate {
    pub admin: AdminView,
    pub current_path: String,
    pub flash: Flash,
    /// `None` when creating.
    pub agent_id: Option<i32>,
    pub site_url: Option<String>,
    pub values: AgentFormValues,
    pub agencies: Vec<AgencyOption>,
}

async fn agency_options(
    state: &AppState,
    selected: Option<AgencyId>,
) -> Result<Vec<AgencyOption>, AppError> {
    Ok(AgencyRepository::new(state.pool())
        .list_options()
        .await?
        .into_iter()
        .map(|(id, name)| AgencyOption {
            id: id.as_i32(),
            name,
            selected: selected == Some(id),
        })
        .collect())
}

#[instrument(skip(admin, state, flash))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(flash): Query<Flash>,
) -> Result<AgentsIndexTemplate, AppError> {
    let agents = AgentRepository::new(state.pool())
        .list()
        .await?
        .into_iter()
        .map(|item| AgentRow {
            site_url: state.config().tenant_url(item.agent.slug.as_str()),
            item,
        })
        .collect();

    Ok(AgentsIndexTemplate {
        admin: AdminView::from(&admin),
        current_path: "/admin/agents".to_string(),
        flash,
        agents,
    })
}

#[instrument(skip(admin, state, flash))]
pub async fn new(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(flash): Query<Flash>,
) -> Result<AgentFormTemplate, AppError> {
    Ok(AgentFormTemplate {
        admin: AdminView::from(&admin),
        current_path: "/admin/agents".to_string(),
        flash,
        agent_id: None,
        site_url: None,
        values: AgentFormValues::default(),
        agencies: agency_options(&state, None).await?,
    })
}

#[instrument(skip(admin, state, flash))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(flash): Query<Flash>,
) -> Result<AgentFormTemplate, AppError> {
    let agent = AgentRepository::new(state.pool())
        .get(AgentId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("agent {id}")))?;

    Ok(AgentFormTemplate {
        admin: AdminView::from(&admin),
        current_path: "/admin/agents".to_string(),
        flash,
        agent_id: Some(id),
        site_url: Some(state.config().tenant_url(agent.slug.as_str())),
        values: AgentFormValues::from(&agent),
        agencies: agency_options(&state, agent.agency_id).await?,
    })
}

#[instrument(skip(admin, state, form))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<AgentForm>,
) -> Redirect {
    match AgentService::new(&state).create(&admin.name, form).await {
        Ok(agent) => redirect_success(
            "/admin/agents",
            &format!("Agent {} created", agent.full_name()),
        ),
        Err(e) => redirect_error("/admin/agents/new", &e.to_string()),
    }
}

#[instrument(skip(admin, state, form))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<AgentForm>,
) -> Redirect {
    match AgentService::new(&state)
        .update(&admin.name, AgentId::new(id), form)
        .await
    {
        Ok(agent) => redirect_success(
            "/admin/agents",
            &format!("Agent {} updated", agent.full_name()),
        ),
        Err(ActionError::NotFound) => redirect_error("/admin/agents", "Agent not found"),
        Err(e) => redirect_error(&format!("/admin/agents/{id}/edit"), &e.to_string()),
    }
}

#[instrument(skip(admin, state))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Redirect {
    match AgentService::new(&state)
        .delete(&admin.name, AgentId::new(id))
        .await
    {
        Ok(agent) => redirect_success(
            "/admin/agents",
            &format!("Agent {} deleted", agent.full_name()),
        ),
        Err(e) => redirect_error("/admin/agents", &e.to_string()),
    }
}
