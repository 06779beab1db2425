//! Agent lifecycle against a real database.

#![allow(clippy::unwrap_used)]

use sqlx::PgPool;

use vitrine_integration_tests::{
    AUTHOR, activity_count, activity_statuses, agent_form, test_state,
};
use vitrine_server::services::{ActionError, AgentService};

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_namesakes_get_distinct_slugs(pool: PgPool) {
    let state = test_state(pool.clone());
    let service = AgentService::new(&state);

    let first = service
        .create(AUTHOR, agent_form("Paul", "Durand", "paul@agence-du-port.fr"))
        .await
        .unwrap();
    let second = service
        .create(AUTHOR, agent_form("Paul", "Durand", "paul.durand@immo-brest.fr"))
        .await
        .unwrap();

    assert_eq!(first.slug.as_str(), "paul-durand");
    assert!(second.slug.as_str().starts_with("paul-durand-"));
    assert_ne!(first.slug, second.slug);

    assert_eq!(activity_count(&pool).await, 2);
    assert_eq!(activity_statuses(&pool).await, ["success", "success"]);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_slug_follows_name_changes_only(pool: PgPool) {
    let state = test_state(pool);
    let service = AgentService::new(&state);
    let agent = service
        .create(AUTHOR, agent_form("Paul", "Durand", "paul@agence-du-port.fr"))
        .await
        .unwrap();

    let mut form = agent_form("Paul", "Durand", "paul@agence-du-port.fr");
    form.city = "Quimper".to_string();
    let moved = service.update(AUTHOR, agent.id, form).await.unwrap();
    assert_eq!(moved.slug, agent.slug);
    assert_eq!(moved.city, "Quimper");

    let renamed = service
        .update(AUTHOR, agent.id, agent_form("Paul", "Le Goff", "paul@agence-du-port.fr"))
        .await
        .unwrap();
    assert_eq!(renamed.slug.as_str(), "paul-le-goff");
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_invalid_form_writes_nothing_but_the_log(pool: PgPool) {
    let state = test_state(pool.clone());
    let service = AgentService::new(&state);

    let result = service
        .create(AUTHOR, agent_form("P", "Durand", "not-an-email"))
        .await;

    assert!(matches!(result, Err(ActionError::Invalid(_))));
    let agents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agent")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(agents, 0);
    assert_eq!(activity_count(&pool).await, 1);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_delete_unknown_agent_is_not_found(pool: PgPool) {
    let state = test_state(pool);

    let result = AgentService::new(&state)
        .delete(AUTHOR, vitrine_core::AgentId::new(4242))
        .await;

    assert!(matches!(result, Err(ActionError::NotFound)));
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_every_agent_mutation_logs_exactly_once(pool: PgPool) {
    let state = test_state(pool.clone());
    let service = AgentService::new(&state);

    let paul = service
        .create(AUTHOR, agent_form("Paul", "Durand", "paul@agence-du-port.fr"))
        .await
        .unwrap();
    assert_eq!(activity_count(&pool).await, 1);

    service
        .update(AUTHOR, paul.id, agent_form("Paul", "Durand", "paul@immo-brest.fr"))
        .await
        .unwrap();
    assert_eq!(activity_count(&pool).await, 2);

    let mut form = agent_form("Paul", "Durand", "paul@immo-brest.fr");
    form.agency_id = Some("abc".to_string());
    let result = service.update(AUTHOR, paul.id, form).await;
    assert!(matches!(result, Err(ActionError::Invalid(_))));
    assert_eq!(activity_count(&pool).await, 3);

    let mut form = agent_form("Paul", "Durand", "paul@immo-brest.fr");
    form.agency_id = Some("999".to_string());
    let result = service.update(AUTHOR, paul.id, form).await;
    assert!(matches!(result, Err(ActionError::NotFound)));
    assert_eq!(activity_count(&pool).await, 4);

    service.delete(AUTHOR, paul.id).await.unwrap();
    let result = service.delete(AUTHOR, paul.id).await;
    assert!(matches!(result, Err(ActionError::NotFound)));

    assert_eq!(
        activity_statuses(&pool).await,
        ["success", "success", "failure", "failure", "success", "failure"]
    );

    let errors: Vec<Option<String>> =
        sqlx::query_scalar("SELECT error FROM activity_log ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(errors.get(2).cloned().flatten().as_deref(), Some("Invalid data: agency_id"));
}
