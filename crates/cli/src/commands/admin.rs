//! Admin management commands.
//!
//! Sign-in only works for emails that already have an admin row, so the first
//! admin has to be created here. Changes are written to the activity log under
//! the `System` author, like any other mutation.

use thiserror::Error;

use vitrine_core::{ActivityAction, ActivityEntity, AdminRole, Email};
use vitrine_server::db::{AdminRepository, RepositoryError};
use vitrine_server::services::{ActionError, ActivityLogger, SYSTEM_AUTHOR};

use super::{CommandError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: standard, super")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Admin already exists.
    #[error("Admin already exists with email: {0}")]
    AdminExists(String),

    /// No admin with that email.
    #[error("No admin with email: {0}")]
    NotFound(String),
}

/// The activity log view of a command result.
fn log_outcome<T>(result: &Result<T, AdminError>) -> Result<(), ActionError> {
    match result {
        Ok(_) => Ok(()),
        Err(AdminError::AdminExists(_)) => Err(ActionError::Conflict(
            "An admin with this email already exists".to_string(),
        )),
        Err(e) => Err(ActionError::Technical(e.to_string())),
    }
}

fn parse_email(email: &str) -> Result<Email, AdminError> {
    Email::parse_normalized(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))
}

/// Create a new admin and return its id.
pub async fn create(email: &str, name: &str, role: &str) -> Result<i32, AdminError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;
    let email = parse_email(email)?;

    let pool = connect().await?;
    let details = format!("{name} ({email})");

    let created = AdminRepository::new(&pool)
        .create(&email, name, role)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::AdminExists(email.to_string()),
            other => AdminError::Repository(other),
        });

    ActivityLogger::new(&pool)
        .outcome(
            SYSTEM_AUTHOR,
            ActivityAction::Create,
            ActivityEntity::Admin,
            &details,
            &log_outcome(&created),
        )
        .await;

    let admin = created?;
    tracing::info!(
        "Admin created! ID: {}, Email: {}, Role: {}",
        admin.id,
        admin.email,
        admin.role.label()
    );
    Ok(admin.id.as_i32())
}

/// Print every admin, one per line.
pub async fn list() -> Result<(), AdminError> {
    let pool = connect().await?;
    let admins = AdminRepository::new(&pool).list().await?;

    #[allow(clippy::print_stdout)]
    {
        if admins.is_empty() {
            println!("No admins yet. Create one with `vitrine-cli admin create`.");
        }
        for admin in &admins {
            let last_login = admin
                .last_login_at
                .map_or_else(|| "never".to_string(), |at| at.format("%Y-%m-%d %H:%M").to_string());
            println!(
                "{:>4}  {:<12}  {:<32}  {}  (last sign in: {last_login})",
                admin.id,
                admin.role.label(),
                admin.email,
                admin.name
            );
        }
    }
    Ok(())
}

/// Remove the admin with `email`.
pub async fn remove(email: &str) -> Result<(), AdminError> {
    let email = parse_email(email)?;
    let pool = connect().await?;
    let repo = AdminRepository::new(&pool);

    let admin = repo
        .get_by_email(&email)
        .await?
        .ok_or_else(|| AdminError::NotFound(email.to_string()))?;
    let removed = repo.delete(admin.id).await.map_err(AdminError::from);

    ActivityLogger::new(&pool)
        .outcome(
            SYSTEM_AUTHOR,
            ActivityAction::Delete,
            ActivityEntity::Admin,
            &format!("{} ({})", admin.name, admin.email),
            &log_outcome(&removed),
        )
        .await;

    removed?;
    tracing::info!("Admin {} removed", admin.email);
    Ok(())
}
