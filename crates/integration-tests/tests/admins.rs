//! Admin management against a real database.

#![allow(clippy::unwrap_used)]

use sqlx::PgPool;

use vitrine_core::AdminId;
use vitrine_integration_tests::{AUTHOR, activity_count, activity_statuses, test_state};
use vitrine_server::forms::AdminForm;
use vitrine_server::services::{ActionError, AdminService, admins::EMAIL_TAKEN};

fn admin_form(email: &str, name: &str, role: &str) -> AdminForm {
    AdminForm {
        email: email.to_string(),
        name: name.to_string(),
        role: role.to_string(),
        ..AdminForm::default()
    }
}

async fn admin_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM admin")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_every_admin_mutation_logs_exactly_once(pool: PgPool) {
    let state = test_state(pool.clone());
    let service = AdminService::new(&state);

    let yann = service
        .create(AUTHOR, admin_form("Yann@Vitrine-Immo.fr", "Yann Kerbrat", "super"))
        .await
        .unwrap();
    assert_eq!(yann.email.as_str(), "yann@vitrine-immo.fr");
    assert_eq!(activity_count(&pool).await, 1);

    let duplicate = service
        .create(AUTHOR, admin_form("yann@vitrine-immo.fr", "Yann K.", ""))
        .await;
    match duplicate {
        Err(ActionError::Conflict(message)) => assert_eq!(message, EMAIL_TAKEN),
        other => panic!("expected Conflict, got {other:?}"),
    }
    assert_eq!(activity_count(&pool).await, 2);

    let unknown_role = service
        .create(AUTHOR, admin_form("lena@vitrine-immo.fr", "Léna Morvan", "root"))
        .await;
    assert!(matches!(unknown_role, Err(ActionError::Invalid(fields)) if fields == "role"));
    assert_eq!(activity_count(&pool).await, 3);
    assert_eq!(admin_count(&pool).await, 1);

    service.delete(AUTHOR, yann.id).await.unwrap();
    let missing = service.delete(AUTHOR, AdminId::new(4242)).await;
    assert!(matches!(missing, Err(ActionError::NotFound)));

    assert_eq!(admin_count(&pool).await, 0);
    assert_eq!(
        activity_statuses(&pool).await,
        ["success", "failure", "failure", "success", "failure"]
    );
}
