//! Marketing home page on the root domain.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::filters;
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub platform_name: String,
    pub root_domain: String,
}

#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> HomeTemplate {
    HomeTemplate {
        platform_name: state.config().tenancy.platform_name.clone(),
        root_domain: state.config().tenancy.root_domain.clone(),
    }
}
