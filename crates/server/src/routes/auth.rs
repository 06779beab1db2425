//! Sign-in through the identity provider.
//!
//! The provider hosts the sign-in page and redirects back to
//! `/auth/callback` with a signed token. A verified identity is stored in the
//! session; whether it may use the dashboard is decided per request by
//! [`RequireAdmin`](crate::middleware::RequireAdmin).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user};
use crate::filters;
use crate::middleware::auth::{clear_identity, current_identity, set_identity};
use crate::routes::{Flash, redirect_error};
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub platform_name: String,
    pub sign_in_url: String,
    pub signed_in_as: Option<String>,
    pub error: Option<String>,
}

/// `?token=` or a posted `token` field.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub token: String,
}

/// Provider sign-in URL that returns to our callback.
fn provider_url(state: &AppState) -> String {
    let callback = format!("{}/auth/callback", state.config().base_url);
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect_url", &callback)
        .finish();
    let sign_in = &state.config().auth.sign_in_url;
    let separator = if sign_in.contains('?') { '&' } else { '?' };
    format!("{sign_in}{separator}{query}")
}

#[instrument(skip(state, session))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Query(flash): Query<Flash>,
) -> LoginTemplate {
    let signed_in_as = current_identity(&session)
        .await
        .map(|identity| identity.email.to_string());

    LoginTemplate {
        platform_name: state.config().tenancy.platform_name.clone(),
        sign_in_url: provider_url(&state),
        signed_in_as,
        error: flash.error,
    }
}

#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    complete_sign_in(&state, &session, &params.token).await
}

#[instrument(skip_all)]
pub async fn callback_form(
    State(state): State<AppState>,
    session: Session,
    Form(params): Form<CallbackParams>,
) -> Result<Response, AppError> {
    complete_sign_in(&state, &session, &params.token).await
}

async fn complete_sign_in(
    state: &AppState,
    session: &Session,
    token: &str,
) -> Result<Response, AppError> {
    if token.trim().is_empty() {
        return Ok(redirect_error("/auth/login", "Missing sign-in token").into_response());
    }

    match state.identity().verify(token) {
        Ok(identity) => {
            tracing::info!(email = %identity.email, "Identity verified");
            set_identity(session, &identity).await?;
            Ok(Redirect::to("/admin").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rejected sign-in token");
            Ok(redirect_error("/auth/login", "Sign-in failed, please try again").into_response())
        }
    }
}

#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_identity(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}
