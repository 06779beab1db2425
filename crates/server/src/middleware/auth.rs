//! Access gating for the dashboard.
//!
//! Signing in only proves an identity. Access is granted when that identity's
//! email belongs to a row in `admin`.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::db::AdminRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::{AuthIdentity, CurrentAdmin, session_keys};
use crate::state::AppState;

/// Extractor that admits only signed-in admins.
///
/// ```rust,ignore
/// async fn handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Why [`RequireAdmin`] turned a request away.
#[derive(Debug)]
pub enum AdminRejection {
    /// No identity in the session (HTML request).
    RedirectToLogin,
    /// No identity in the session (API request).
    Unauthorized,
    /// Signed in, but not an admin (HTML request). The login page explains.
    RedirectNotAdmin,
    /// Signed in, but not an admin (API request).
    Forbidden,
    /// Session or database failure.
    Internal(String),
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => {
                AppError::Unauthorized("sign in required".to_string()).into_response()
            }
            Self::RedirectNotAdmin => Redirect::to("/auth/login").into_response(),
            Self::Forbidden => AppError::Forbidden("not an admin".to_string()).into_response(),
            Self::Internal(reason) => AppError::Internal(reason).into_response(),
        }
    }
}

/// Nested routers strip their prefix from `parts.uri`, so look at the
/// original URI.
fn is_api(parts: &Parts) -> bool {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or(parts.uri.path(), |uri| uri.0.path())
        .starts_with("/api/")
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let api = is_api(parts);

        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AdminRejection::Internal("session layer missing".to_string()))?;

        let identity = current_identity(session).await.ok_or(if api {
            AdminRejection::Unauthorized
        } else {
            AdminRejection::RedirectToLogin
        })?;

        let repo = AdminRepository::new(state.pool());
        let admin = repo
            .get_by_email(&identity.email)
            .await
            .map_err(|e| AdminRejection::Internal(format!("admin lookup failed: {e}")))?
            .ok_or_else(|| {
                tracing::info!(email = %identity.email, "Signed-in user is not an admin");
                if api {
                    AdminRejection::Forbidden
                } else {
                    AdminRejection::RedirectNotAdmin
                }
            })?;

        if let Err(e) = repo.stamp_last_login(admin.id).await {
            tracing::warn!(admin_id = %admin.id, error = %e, "Failed to stamp last login");
        }

        set_sentry_user(admin.id.as_i32(), Some(admin.email.as_str()));

        Ok(Self(admin.into()))
    }
}

/// The verified identity stored in the session, if any.
pub async fn current_identity(session: &Session) -> Option<AuthIdentity> {
    session
        .get::<AuthIdentity>(session_keys::AUTH_IDENTITY)
        .await
        .ok()
        .flatten()
}

/// Store a verified identity in the session.
///
/// The session ID is cycled first so a pre-login session cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_identity(
    session: &Session,
    identity: &AuthIdentity,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::AUTH_IDENTITY, identity).await
}

/// Drop the whole session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted from the store.
pub async fn clear_identity(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{StatusCode, header::LOCATION};

    use super::*;

    #[test]
    fn test_api_rejections_use_error_statuses() {
        assert_eq!(
            AdminRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AdminRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AdminRejection::Internal("pool closed".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_page_rejections_redirect_to_login() {
        for rejection in [AdminRejection::RedirectToLogin, AdminRejection::RedirectNotAdmin] {
            let response = rejection.into_response();
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(response.headers().get(LOCATION).unwrap(), "/auth/login");
        }
    }
}
