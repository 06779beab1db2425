//! Public tenant pages.
//!
//! Requests reach `/sites/{slug}` either directly or through the tenant
//! rewrite of `{slug}.{root_domain}`. The slug is looked up in both tenant
//! tables; when nobody owns it the 404 page is rendered.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use vitrine_core::{AgencyId, AgentId, Slug, TenantRef};

use crate::db::{AgencyRepository, AgentRepository, SlugRepository};
use crate::error::{AppError, not_found_page};
use crate::filters;
use crate::models::{Agency, Agent};
use crate::state::AppState;

/// A member card on an agency page.
#[derive(Debug, Clone)]
pub struct MemberView {
    pub full_name: String,
    pub photo_url: Option<String>,
    pub phone: String,
    pub email: String,
    pub site_url: String,
    pub is_manager: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "sites/agent.html")]
pub struct AgentSiteTemplate {
    pub platform_name: String,
    pub agent: Agent,
    pub agency: Option<Agency>,
    pub agency_url: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "sites/agency.html")]
pub struct AgencySiteTemplate {
    pub platform_name: String,
    pub agency: Agency,
    pub members: Vec<MemberView>,
}

/// Render the page of whoever owns `slug`.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let Ok(slug) = Slug::parse(&slug) else {
        return Ok(not_found_page());
    };

    match SlugRepository::new(state.pool()).owner(&slug).await? {
        Some(TenantRef::Agent(id)) => agent_page(&state, id).await,
        Some(TenantRef::Agency(id)) => agency_page(&state, id).await,
        None => Ok(not_found_page()),
    }
}

async fn agent_page(state: &AppState, id: AgentId) -> Result<Response, AppError> {
    let Some(agent) = AgentRepository::new(state.pool()).get(id).await? else {
        return Ok(not_found_page());
    };

    let agency = match agent.agency_id {
        Some(agency_id) => AgencyRepository::new(state.pool()).get(agency_id).await?,
        None => None,
    };
    let agency_url = agency
        .as_ref()
        .map(|a| state.config().tenant_url(a.slug.as_str()));

    Ok(AgentSiteTemplate {
        platform_name: state.config().tenancy.platform_name.clone(),
        agent,
        agency,
        agency_url,
    }
    .into_response())
}

async fn agency_page(state: &AppState, id: AgencyId) -> Result<Response, AppError> {
    let Some(agency) = AgencyRepository::new(state.pool()).get(id).await? else {
        return Ok(not_found_page());
    };

    let members = AgentRepository::new(state.pool())
        .list_by_agency(id)
        .await?
        .into_iter()
        .map(|m| MemberView {
            site_url: state.config().tenant_url(m.slug.as_str()),
            is_manager: agency.manager_id == Some(m.id),
            full_name: m.full_name,
            photo_url: m.photo_url,
            phone: m.phone,
            email: m.email.to_string(),
        })
        .collect();

    Ok(AgencySiteTemplate {
        platform_name: state.config().tenancy.platform_name.clone(),
        agency,
        members,
    }
    .into_response())
}
