//! Visit counting and the tracking endpoint.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use sqlx::PgPool;
use tower::ServiceExt;

use vitrine_core::{AgentId, TenantRef};
use vitrine_integration_tests::{AUTHOR, agent_form, body_text, test_state};
use vitrine_server::db::{AnalyticsRepository, RepositoryError};
use vitrine_server::routes;
use vitrine_server::services::AgentService;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_counter_increments_per_day(pool: PgPool) {
    let state = test_state(pool.clone());
    let paul = AgentService::new(&state)
        .create(AUTHOR, agent_form("Paul", "Durand", "paul@agence-du-port.fr"))
        .await
        .unwrap();
    let repo = AnalyticsRepository::new(&pool);
    let tenant = TenantRef::Agent(paul.id);

    assert_eq!(repo.record_visit(tenant, day(14)).await.unwrap(), 1);
    assert_eq!(repo.record_visit(tenant, day(14)).await.unwrap(), 2);
    assert_eq!(repo.record_visit(tenant, day(15)).await.unwrap(), 1);

    let rows = repo.list(Some(tenant), None).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.iter().map(|r| r.visits).sum::<i32>(), 3);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_visits_are_not_lost(pool: PgPool) {
    let state = test_state(pool.clone());
    let paul = AgentService::new(&state)
        .create(AUTHOR, agent_form("Paul", "Durand", "paul@agence-du-port.fr"))
        .await
        .unwrap();
    let tenant = TenantRef::Agent(paul.id);

    let mut handles = Vec::new();
    for _ in 0..20 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            AnalyticsRepository::new(&pool)
                .record_visit(tenant, day(14))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let rows = AnalyticsRepository::new(&pool).for_day(day(14)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.first().unwrap().visits, 20);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_unknown_tenant_is_not_found(pool: PgPool) {
    let result = AnalyticsRepository::new(&pool)
        .record_visit(TenantRef::Agent(AgentId::new(4242)), day(14))
        .await;

    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_track_visit_endpoint_returns_the_count(pool: PgPool) {
    let state = test_state(pool);
    let paul = AgentService::new(&state)
        .create(AUTHOR, agent_form("Paul", "Durand", "paul@agence-du-port.fr"))
        .await
        .unwrap();
    let app = routes::app(state);

    let post = |body: String| {
        Request::builder()
            .method("POST")
            .uri("/api/track-visit")
            .header("host", "localhost:3000")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    };

    let body = format!(r#"{{"agentId":{}}}"#, paul.id);
    let response = app.clone().oneshot(post(body.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.clone().oneshot(post(body)).await.unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&body_text(response.into_body()).await).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["visits"], 2);

    let response = app.oneshot(post(r#"{"agencyId":4242}"#.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
