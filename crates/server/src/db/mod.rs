//! Database access for the Vitrine `PostgreSQL` schema.
//!
//! ## Tables
//!
//! - `agent` - Agent microsites
//! - `agency` - Agency microsites (`manager_id` → agent)
//! - `admin` - Dashboard administrators
//! - `activity_log` - Append-only mutation audit trail
//! - `analytics` - Per-day visit counters
//! - `session` - tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p vitrine-cli -- migrate
//! ```
//!
//! Queries are checked at runtime (`sqlx::query_as` + `FromRow`), so the
//! workspace builds without a live database.

pub mod activity_log;
pub mod admins;
pub mod agencies;
pub mod agents;
pub mod analytics;
pub mod slugs;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use activity_log::ActivityLogRepository;
pub use admins::AdminRepository;
pub use agencies::AgencyRepository;
pub use agents::AgentRepository;
pub use analytics::AnalyticsRepository;
pub use slugs::SlugRepository;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation. Carries the constraint name.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The row is still referenced by another table. Carries the constraint name.
    #[error("still referenced: {0}")]
    InUse(String),
}

/// Name of the violated unique constraint, if `err` is one.
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Some(
            db_err
                .constraint()
                .unwrap_or("unique")
                .to_owned(),
        ),
        _ => None,
    }
}

/// Name of the violated foreign key, if `err` is one.
pub(crate) fn foreign_key_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => Some(
            db_err
                .constraint()
                .unwrap_or("foreign_key")
                .to_owned(),
        ),
        _ => None,
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
