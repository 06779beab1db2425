//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health, /health/ready      - Liveness / readiness
//! GET  /                           - Marketing home
//! GET  /sites/{slug}               - Tenant page (agent or agency)
//!
//! # API
//! POST /api/track-visit            - Count one visit
//! GET  /api/stats                  - Today's counters (admin)
//! GET  /api/analytics              - Summary + chart series (admin)
//!
//! # Auth
//! GET  /auth/login                 - Link to the identity provider
//! GET|POST /auth/callback          - Store the verified identity
//! POST /auth/logout                - Drop the session
//!
//! # Dashboard (admin)
//! GET  /admin                      - Overview
//! GET  /admin/agents               - Agents     (+ /new, /{id}/edit, POST, /{id}, /{id}/delete)
//! GET  /admin/agencies             - Agencies   (same shape)
//! GET  /admin/admins               - Admins     (POST, /{id}/delete)
//! GET  /admin/activity?page=N      - Activity log
//! GET  /admin/analytics            - Visit analytics
//! ```

pub mod activity;
pub mod admins;
pub mod agencies;
pub mod agents;
pub mod analytics;
pub mod api;
pub mod auth;
pub mod dashboard;
pub mod home;
pub mod sites;

use std::convert::Infallible;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    response::{Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower::{Layer, Service};
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{
    create_session_layer, request_id_middleware, security_headers_middleware, tenant_rewrite,
};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Flash message carried in the query string after a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct Flash {
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Redirect (303) to `path` with a `?success=` flash message.
#[must_use]
pub fn redirect_success(path: &str, message: &str) -> Redirect {
    redirect_with(path, "success", message)
}

/// Redirect (303) to `path` with an `?error=` flash message.
#[must_use]
pub fn redirect_error(path: &str, message: &str) -> Redirect {
    redirect_with(path, "error", message)
}

fn redirect_with(path: &str, key: &str, message: &str) -> Redirect {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair(key, message)
        .finish();
    Redirect::to(&format!("{path}?{query}"))
}

/// Signed-in admin, as shown in the dashboard chrome.
#[derive(Debug, Clone)]
pub struct AdminView {
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<&CurrentAdmin> for AdminView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.to_string(),
            role: admin.role.label().to_string(),
        }
    }
}

/// All routes, without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/", get(home::index))
        .route("/sites/{slug}", get(sites::show))
        .nest("/api", api::routes())
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback).post(auth::callback_form))
        .route("/auth/logout", post(auth::logout))
        .route("/admin", get(dashboard::index))
        .route("/admin/agents", get(agents::index).post(agents::create))
        .route("/admin/agents/new", get(agents::new))
        .route("/admin/agents/{id}", post(agents::update))
        .route("/admin/agents/{id}/edit", get(agents::edit))
        .route("/admin/agents/{id}/delete", post(agents::delete))
        .route("/admin/agencies", get(agencies::index).post(agencies::create))
        .route("/admin/agencies/new", get(agencies::new))
        .route("/admin/agencies/{id}", post(agencies::update))
        .route("/admin/agencies/{id}/edit", get(agencies::edit))
        .route("/admin/agencies/{id}/delete", post(agencies::delete))
        .route("/admin/admins", get(admins::index).post(admins::create))
        .route("/admin/admins/{id}/delete", post(admins::delete))
        .route("/admin/activity", get(activity::index))
        .route("/admin/analytics", get(analytics::index))
        .fallback(not_found)
}

/// The routed application with its middleware stack, before tenant rewriting.
pub fn router(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());

    routes()
        .nest_service(
            "/static",
            ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
        )
        .layer(session_layer)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// The full service: tenant rewriting and path normalization wrap the router
/// so they run before routing.
pub fn app(
    state: AppState,
) -> impl Service<Request, Response = Response, Error = Infallible, Future: Send>
+ Clone
+ Send
+ 'static {
    let tenants = state.tenants().clone();
    let normalized = NormalizePathLayer::trim_trailing_slash().layer(router(state));
    axum::middleware::from_fn_with_state(tenants, tenant_rewrite).layer(normalized)
}

/// Liveness health check. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check: 503 when the database is unreachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn not_found() -> Response {
    crate::error::not_found_page()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::IntoResponse;
    use tower::ServiceExt;

    use super::*;
    use crate::state::tests::test_state;

    fn get(uri: &str, host: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::HOST, host)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_is_ok() {
        let response = app(test_state())
            .oneshot(get("/health", "localhost:3000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("content-security-policy"));
    }

    #[tokio::test]
    async fn test_health_is_not_rewritten_on_tenant_hosts() {
        let response = app(test_state())
            .oneshot(get("/health", "paul-durand.vitrine-immo.fr"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_without_session_redirects_to_login() {
        let response = app(test_state())
            .oneshot(get("/admin", "localhost:3000"))
            .await
            .unwrap();

        assert!(response.status().is_redirection());
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login"
        );
    }

    #[tokio::test]
    async fn test_admin_path_on_tenant_host_is_scoped_to_the_site() {
        // `/admin` becomes `/sites/paul-durand/admin`, which no route serves.
        let response = app(test_state())
            .oneshot(get("/admin", "paul-durand.vitrine-immo.fr"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_trailing_slash_is_trimmed() {
        let response = app(test_state())
            .oneshot(get("/health/", "localhost:3000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_without_session_is_unauthorized() {
        let response = app(test_state())
            .oneshot(get("/api/stats", "localhost:3000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_track_visit_with_both_ids_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/track-visit")
            .header(header::HOST, "localhost:3000")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"agentId":1,"agencyId":2}"#))
            .unwrap();

        let response = app(test_state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route_renders_not_found_page() {
        let response = app(test_state())
            .oneshot(get("/nope", "localhost:3000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_redirect_success_encodes_message() {
        let response = redirect_success("/admin/agents", "Paul Durand & co saved").into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/admin/agents?success=Paul+Durand+%26+co+saved"
        );
    }
}
