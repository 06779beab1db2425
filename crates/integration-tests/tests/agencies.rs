//! Agency uniqueness and deletion rules.

#![allow(clippy::unwrap_used)]

use sqlx::PgPool;

use vitrine_integration_tests::{
    AUTHOR, ROOT_DOMAIN, activity_count, activity_statuses, agency_form, agent_form, test_state,
};
use vitrine_server::db::{AgencyRepository, RepositoryError, slugs::SHARED_SLUG};
use vitrine_server::services::{ActionError, AgencyService, AgentService};

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_email_is_refused_without_a_row(pool: PgPool) {
    let state = test_state(pool.clone());
    let service = AgencyService::new(&state);

    service
        .create(AUTHOR, agency_form("Agence du Port", "contact@agence-du-port.fr"))
        .await
        .unwrap();
    let result = service
        .create(AUTHOR, agency_form("Immo Brest", "Contact@Agence-du-Port.fr"))
        .await;

    match result {
        Err(ActionError::Conflict(message)) => {
            assert_eq!(message, "An agency with this email already exists");
        }
        other => panic!("expected a conflict, got {other:?}"),
    }
    let agencies: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agency")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(agencies, 1);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_agent_manages_at_most_one_agency(pool: PgPool) {
    let state = test_state(pool);
    let paul = AgentService::new(&state)
        .create(AUTHOR, agent_form("Paul", "Durand", "paul@agence-du-port.fr"))
        .await
        .unwrap();
    let service = AgencyService::new(&state);

    let mut first = agency_form("Agence du Port", "contact@agence-du-port.fr");
    first.manager_id = Some(paul.id.to_string());
    service.create(AUTHOR, first).await.unwrap();

    let mut second = agency_form("Immo Brest", "contact@immo-brest.fr");
    second.manager_id = Some(paul.id.to_string());
    let result = service.create(AUTHOR, second).await;

    assert!(matches!(result, Err(ActionError::Conflict(_))));
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_agency_with_agents_cannot_be_deleted(pool: PgPool) {
    let state = test_state(pool.clone());
    let agency = AgencyService::new(&state)
        .create(AUTHOR, agency_form("Agence du Port", "contact@agence-du-port.fr"))
        .await
        .unwrap();
    let mut form = agent_form("Paul", "Durand", "paul@agence-du-port.fr");
    form.agency_id = Some(agency.id.to_string());
    let paul = AgentService::new(&state).create(AUTHOR, form).await.unwrap();

    let refused = AgencyService::new(&state).delete(AUTHOR, agency.id).await;
    assert!(matches!(refused, Err(ActionError::InUse(_))));

    AgentService::new(&state).delete(AUTHOR, paul.id).await.unwrap();
    let deleted = AgencyService::new(&state).delete(AUTHOR, agency.id).await.unwrap();
    assert_eq!(deleted.id, agency.id);

    assert_eq!(
        activity_statuses(&pool).await,
        ["success", "success", "failure", "success", "success"]
    );
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_agent_and_agency_share_the_slug_namespace(pool: PgPool) {
    let state = test_state(pool);
    let agent = AgentService::new(&state)
        .create(AUTHOR, agent_form("Port", "Brest", "port@example.fr"))
        .await
        .unwrap();
    let agency = AgencyService::new(&state)
        .create(AUTHOR, agency_form("Port Brest", "contact@port-brest.fr"))
        .await
        .unwrap();

    assert_eq!(agent.slug.as_str(), "port-brest");
    assert_ne!(agency.slug, agent.slug);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_every_mutation_logs_exactly_once(pool: PgPool) {
    let state = test_state(pool.clone());
    let agencies = AgencyService::new(&state);

    let agency = agencies
        .create(AUTHOR, agency_form("Agence du Port", "contact@agence-du-port.fr"))
        .await
        .unwrap();
    assert_eq!(activity_count(&pool).await, 1);

    agencies
        .update(AUTHOR, agency.id, agency_form("Agence du Port", "accueil@agence-du-port.fr"))
        .await
        .unwrap();
    assert_eq!(activity_count(&pool).await, 2);

    let _ = agencies
        .create(AUTHOR, agency_form("Doublon", "accueil@agence-du-port.fr"))
        .await;
    assert_eq!(activity_count(&pool).await, 3);

    agencies.delete(AUTHOR, agency.id).await.unwrap();
    assert_eq!(activity_count(&pool).await, 4);

    let statuses: Vec<String> =
        sqlx::query_scalar("SELECT status::TEXT FROM activity_log ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(statuses, ["success", "success", "failure", "success"]);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_reserved_names_get_a_reachable_slug(pool: PgPool) {
    let state = test_state(pool);

    let agency = AgencyService::new(&state)
        .create(AUTHOR, agency_form("Admin", "contact@admin-immo.fr"))
        .await
        .unwrap();

    assert!(agency.slug.as_str().starts_with("admin-"));
    let host = format!("{}.{ROOT_DOMAIN}", agency.slug);
    assert_eq!(
        state.tenants().resolve(&host),
        Some(agency.slug.to_string())
    );
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_database_refuses_a_slug_owned_by_an_agent(pool: PgPool) {
    let state = test_state(pool.clone());
    let agent = AgentService::new(&state)
        .create(AUTHOR, agent_form("Port", "Brest", "port@example.fr"))
        .await
        .unwrap();

    let fields = agency_form("Port Brest", "contact@port-brest.fr")
        .into_fields()
        .unwrap();
    let result = AgencyRepository::new(&pool).create(&fields, &agent.slug).await;

    match result {
        Err(RepositoryError::Conflict(constraint)) => assert_eq!(constraint, SHARED_SLUG),
        other => panic!("expected a slug conflict, got {other:?}"),
    }
}
