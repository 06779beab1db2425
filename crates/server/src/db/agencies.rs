//! Agency repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vitrine_core::{AgencyId, AgentId, Email, Slug};

use super::{RepositoryError, foreign_key_violation, unique_violation};
use crate::models::{Agency, AgencyFields, AgencyListItem};

/// Unique constraint on `agency.email`.
pub const EMAIL_UNIQUE: &str = "agency_email_key";
/// Unique constraint on `agency.manager_id`.
pub const MANAGER_UNIQUE: &str = "agency_manager_id_key";
/// Unique constraint on `agency.slug`.
pub const SLUG_UNIQUE: &str = "agency_slug_key";

const AGENCY_COLUMNS: &str =
    "id, name, slug, address, city, zip_code, phone, email, manager_id, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct AgencyRow {
    id: i32,
    name: String,
    slug: String,
    address: String,
    city: String,
    zip_code: String,
    phone: String,
    email: String,
    manager_id: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AgencyRow> for Agency {
    type Error = RepositoryError;

    fn try_from(row: AgencyRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid agency email in database: {e}"))
        })?;
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid agency slug in database: {e}"))
        })?;

        Ok(Self {
            id: AgencyId::new(row.id),
            name: row.name,
            slug,
            address: row.address,
            city: row.city,
            zip_code: row.zip_code,
            phone: row.phone,
            email,
            manager_id: row.manager_id.map(AgentId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AgencyListRow {
    #[sqlx(flatten)]
    agency: AgencyRow,
    manager_name: Option<String>,
    member_count: i64,
}

/// Map write errors. An unknown `manager_id` surfaces as `NotFound`.
fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let Some(constraint) = unique_violation(&e) {
        return RepositoryError::Conflict(constraint);
    }
    if foreign_key_violation(&e).is_some() {
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(e)
}

/// Repository for agency database operations.
pub struct AgencyRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AgencyRepository<'a> {
    /// Create a new agency repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all agencies with their manager and member count, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(&self) -> Result<Vec<AgencyListItem>, RepositoryError> {
        let rows: Vec<AgencyListRow> = sqlx::query_as(
            r"
            SELECT g.id, g.name, g.slug, g.address, g.city, g.zip_code, g.phone, g.email,
                   g.manager_id, g.created_at, g.updated_at,
                   m.first_name || ' ' || m.last_name AS manager_name,
                   (SELECT COUNT(*) FROM agent a WHERE a.agency_id = g.id) AS member_count
            FROM agency g
            LEFT JOIN agent m ON m.id = g.manager_id
            ORDER BY g.name, g.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(AgencyListItem {
                    agency: row.agency.try_into()?,
                    manager_name: row.manager_name,
                    member_count: row.member_count,
                })
            })
            .collect()
    }

    /// `(id, name)` pairs for select inputs, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_options(&self) -> Result<Vec<(AgencyId, String)>, RepositoryError> {
        let rows: Vec<(i32, String)> =
            sqlx::query_as("SELECT id, name FROM agency ORDER BY name, id")
                .fetch_all(self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| (AgencyId::new(id), name))
            .collect())
    }

    /// Get an agency by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get(&self, id: AgencyId) -> Result<Option<Agency>, RepositoryError> {
        let row: Option<AgencyRow> =
            sqlx::query_as(&format!("SELECT {AGENCY_COLUMNS} FROM agency WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an agency by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_slug(&self, slug: &Slug) -> Result<Option<Agency>, RepositoryError> {
        let row: Option<AgencyRow> =
            sqlx::query_as(&format!("SELECT {AGENCY_COLUMNS} FROM agency WHERE slug = $1"))
                .bind(slug)
                .fetch_optional(self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Whether another agency already uses `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn email_taken(
        &self,
        email: &Email,
        except: Option<AgencyId>,
    ) -> Result<bool, RepositoryError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM agency WHERE email = $1 AND ($2::INTEGER IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except)
        .fetch_one(self.pool)
        .await?;
        Ok(taken)
    }

    /// Whether `manager_id` already manages another agency.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn manager_taken(
        &self,
        manager_id: AgentId,
        except: Option<AgencyId>,
    ) -> Result<bool, RepositoryError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM agency WHERE manager_id = $1 AND ($2::INTEGER IS NULL OR id <> $2))",
        )
        .bind(manager_id)
        .bind(except)
        .fetch_one(self.pool)
        .await?;
        Ok(taken)
    }

    /// Insert an agency under an already-available slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` with the constraint name on a
    /// duplicate email, manager or slug.
    /// Returns `RepositoryError::NotFound` if `manager_id` does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        fields: &AgencyFields,
        slug: &Slug,
    ) -> Result<Agency, RepositoryError> {
        let row: AgencyRow = sqlx::query_as(&format!(
            r"
            INSERT INTO agency (name, slug, address, city, zip_code, phone, email, manager_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {AGENCY_COLUMNS}
            "
        ))
        .bind(&fields.name)
        .bind(slug)
        .bind(&fields.address)
        .bind(&fields.city)
        .bind(&fields.zip_code)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(fields.manager_id)
        .fetch_one(self.pool)
        .await
        .map_err(map_write_error)?;

        row.try_into()
    }

    /// Overwrite an agency's attributes and slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the agency (or the manager) does
    /// not exist.
    /// Returns `RepositoryError::Conflict` with the constraint name on a
    /// duplicate email, manager or slug.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: AgencyId,
        fields: &AgencyFields,
        slug: &Slug,
    ) -> Result<Agency, RepositoryError> {
        let row: Option<AgencyRow> = sqlx::query_as(&format!(
            r"
            UPDATE agency
            SET name = $2, slug = $3, address = $4, city = $5, zip_code = $6, phone = $7,
                email = $8, manager_id = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {AGENCY_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&fields.name)
        .bind(slug)
        .bind(&fields.address)
        .bind(&fields.city)
        .bind(&fields.zip_code)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(fields.manager_id)
        .fetch_optional(self.pool)
        .await
        .map_err(map_write_error)?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete an agency.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InUse` while agents still belong to it.
    /// Returns `RepositoryError::NotFound` if the agency doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: AgencyId) -> Result<Agency, RepositoryError> {
        let row: Option<AgencyRow> = sqlx::query_as(&format!(
            "DELETE FROM agency WHERE id = $1 RETURNING {AGENCY_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| match foreign_key_violation(&e) {
            Some(constraint) => RepositoryError::InUse(constraint),
            None => RepositoryError::Database(e),
        })?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Number of agencies.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agency")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
