//! Sign-in through the provider callback and the admin gate.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use sqlx::PgPool;
use tower::ServiceExt;

use vitrine_core::{AdminRole, Email};
use vitrine_integration_tests::{body_text, get, sign_in_token, test_state};
use vitrine_server::db::AdminRepository;
use vitrine_server::routes;

/// The `name=value` part of the session cookie set by `response`.
fn session_cookie(response: &axum::response::Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

fn with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, "localhost:3000")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_admin_signs_in_and_reaches_the_dashboard(pool: PgPool) {
    let email = Email::parse_normalized("claire@vitrine-immo.fr").unwrap();
    AdminRepository::new(&pool)
        .create(&email, "Claire Martin", AdminRole::Super)
        .await
        .unwrap();
    let app = routes::app(test_state(pool.clone()));

    let token = sign_in_token("Claire@Vitrine-Immo.fr", "Claire Martin");
    let callback = app
        .clone()
        .oneshot(get(&format!("/auth/callback?token={token}"), "localhost:3000"))
        .await
        .unwrap();
    assert_eq!(callback.status(), StatusCode::SEE_OTHER);
    assert_eq!(callback.headers().get(header::LOCATION).unwrap(), "/admin");
    let cookie = session_cookie(&callback);
    assert!(cookie.starts_with("vitrine_session="));

    let dashboard = app
        .clone()
        .oneshot(with_cookie("/admin", &cookie))
        .await
        .unwrap();
    assert_eq!(dashboard.status(), StatusCode::OK);
    assert!(body_text(dashboard.into_body()).await.contains("Claire Martin"));

    let stats = app.oneshot(with_cookie("/api/stats", &cookie)).await.unwrap();
    assert_eq!(stats.status(), StatusCode::OK);

    let admin = AdminRepository::new(&pool).get_by_email(&email).await.unwrap().unwrap();
    assert!(admin.last_login_at.is_some());
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_signed_in_non_admin_is_kept_out(pool: PgPool) {
    let app = routes::app(test_state(pool));

    let token = sign_in_token("visitor@example.fr", "Visitor");
    let callback = app
        .clone()
        .oneshot(get(&format!("/auth/callback?token={token}"), "localhost:3000"))
        .await
        .unwrap();
    let cookie = session_cookie(&callback);

    let dashboard = app
        .clone()
        .oneshot(with_cookie("/admin", &cookie))
        .await
        .unwrap();
    assert!(dashboard.status().is_redirection());

    let stats = app.oneshot(with_cookie("/api/stats", &cookie)).await.unwrap();
    assert_eq!(stats.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_bad_token_returns_to_login_with_an_error(pool: PgPool) {
    let response = routes::app(test_state(pool))
        .oneshot(get("/auth/callback?token=forged", "localhost:3000"))
        .await
        .unwrap();

    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.starts_with("/auth/login?error="));
}
