//! Admin repository.
//!
//! Emails are stored lowercased; callers pass [`Email`] values built with
//! [`Email::parse_normalized`] and lookups compare exactly.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vitrine_core::{AdminId, AdminRole, Email};

use super::{RepositoryError, unique_violation};
use crate::models::Admin;

/// Unique constraint on `admin.email`.
pub const EMAIL_UNIQUE: &str = "admin_email_key";

#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: i32,
    email: String,
    name: String,
    role: AdminRole,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdminRow> for Admin {
    type Error = RepositoryError;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        let email = Email::parse_normalized(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid admin email in database: {e}"))
        })?;

        Ok(Self {
            id: AdminId::new(row.id),
            email,
            name: row.name,
            role: row.role,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
        })
    }
}

/// Repository for admin database operations.
pub struct AdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRepository<'a> {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all admins, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(&self) -> Result<Vec<Admin>, RepositoryError> {
        let rows: Vec<AdminRow> = sqlx::query_as(
            r"
            SELECT id, email, name, role, last_login_at, created_at
            FROM admin
            ORDER BY created_at, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Super admins, the recipients of team notifications.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_super_admins(&self) -> Result<Vec<Admin>, RepositoryError> {
        let rows: Vec<AdminRow> = sqlx::query_as(
            r"
            SELECT id, email, name, role, last_login_at, created_at
            FROM admin
            WHERE role = 'super'
            ORDER BY created_at, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an admin by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get(&self, id: AdminId) -> Result<Option<Admin>, RepositoryError> {
        let row: Option<AdminRow> = sqlx::query_as(
            "SELECT id, email, name, role, last_login_at, created_at FROM admin WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an admin by (lowercased) email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Admin>, RepositoryError> {
        let row: Option<AdminRow> = sqlx::query_as(
            "SELECT id, email, name, role, last_login_at, created_at FROM admin WHERE email = $1",
        )
        .bind(email.as_str().to_lowercase())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a new admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        name: &str,
        role: AdminRole,
    ) -> Result<Admin, RepositoryError> {
        let row: AdminRow = sqlx::query_as(
            r"
            INSERT INTO admin (email, name, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, role, last_login_at, created_at
            ",
        )
        .bind(email.as_str().to_lowercase())
        .bind(name)
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(constraint) => RepositoryError::Conflict(constraint),
            None => RepositoryError::Database(e),
        })?;

        row.try_into()
    }

    /// Delete an admin, returning the removed row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the admin doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: AdminId) -> Result<Admin, RepositoryError> {
        let row: Option<AdminRow> = sqlx::query_as(
            r"
            DELETE FROM admin
            WHERE id = $1
            RETURNING id, email, name, role, last_login_at, created_at
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Record that the admin just passed the access check.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stamp_last_login(&self, id: AdminId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE admin SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Number of admins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
