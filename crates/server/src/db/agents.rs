//! Agent repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vitrine_core::{AgencyId, AgentId, Email, Slug};

use super::{RepositoryError, foreign_key_violation, unique_violation};
use crate::models::{Agent, AgentFields, AgentListItem, AgencyMember};

/// Unique constraint on `agent.slug`.
pub const SLUG_UNIQUE: &str = "agent_slug_key";

const AGENT_COLUMNS: &str = "id, first_name, last_name, slug, email, phone, photo_url, city, \
     zip_code, secondary_sector, facebook_url, instagram_url, linkedin_url, bio, agency_id, \
     created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AgentRow {
    id: i32,
    first_name: String,
    last_name: String,
    slug: String,
    email: String,
    phone: String,
    photo_url: Option<String>,
    city: String,
    zip_code: String,
    secondary_sector: Option<String>,
    facebook_url: Option<String>,
    instagram_url: Option<String>,
    linkedin_url: Option<String>,
    bio: Option<String>,
    agency_id: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AgentRow> for Agent {
    type Error = RepositoryError;

    fn try_from(row: AgentRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid agent email in database: {e}"))
        })?;
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid agent slug in database: {e}"))
        })?;

        Ok(Self {
            id: AgentId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            slug,
            email,
            phone: row.phone,
            photo_url: row.photo_url,
            city: row.city,
            zip_code: row.zip_code,
            secondary_sector: row.secondary_sector,
            facebook_url: row.facebook_url,
            instagram_url: row.instagram_url,
            linkedin_url: row.linkedin_url,
            bio: row.bio,
            agency_id: row.agency_id.map(AgencyId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AgentListRow {
    #[sqlx(flatten)]
    agent: AgentRow,
    agency_name: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    id: i32,
    first_name: String,
    last_name: String,
    slug: String,
    photo_url: Option<String>,
    phone: String,
    email: String,
}

impl TryFrom<MemberRow> for AgencyMember {
    type Error = RepositoryError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: AgentId::new(row.id),
            full_name: format!("{} {}", row.first_name, row.last_name),
            slug: Slug::parse(&row.slug).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid agent slug in database: {e}"))
            })?,
            photo_url: row.photo_url,
            phone: row.phone,
            email: Email::parse(&row.email).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid agent email in database: {e}"))
            })?,
        })
    }
}

/// Map write errors. An unknown `agency_id` surfaces as `NotFound`.
fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let Some(constraint) = unique_violation(&e) {
        return RepositoryError::Conflict(constraint);
    }
    if foreign_key_violation(&e).is_some() {
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(e)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for agent database operations.
pub struct AgentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AgentRepository<'a> {
    /// Create a new agent repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all agents with their agency name, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(&self) -> Result<Vec<AgentListItem>, RepositoryError> {
        let rows: Vec<AgentListRow> = sqlx::query_as(
            r"
            SELECT a.id, a.first_name, a.last_name, a.slug, a.email, a.phone, a.photo_url,
                   a.city, a.zip_code, a.secondary_sector, a.facebook_url, a.instagram_url,
                   a.linkedin_url, a.bio, a.agency_id, a.created_at, a.updated_at,
                   g.name AS agency_name
            FROM agent a
            LEFT JOIN agency g ON g.id = a.agency_id
            ORDER BY a.last_name, a.first_name, a.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(AgentListItem {
                    agent: row.agent.try_into()?,
                    agency_name: row.agency_name,
                })
            })
            .collect()
    }

    /// Get an agent by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get(&self, id: AgentId) -> Result<Option<Agent>, RepositoryError> {
        let row: Option<AgentRow> =
            sqlx::query_as(&format!("SELECT {AGENT_COLUMNS} FROM agent WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an agent by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_slug(&self, slug: &Slug) -> Result<Option<Agent>, RepositoryError> {
        let row: Option<AgentRow> =
            sqlx::query_as(&format!("SELECT {AGENT_COLUMNS} FROM agent WHERE slug = $1"))
                .bind(slug)
                .fetch_optional(self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Agents belonging to an agency, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_by_agency(
        &self,
        agency_id: AgencyId,
    ) -> Result<Vec<AgencyMember>, RepositoryError> {
        let rows: Vec<MemberRow> = sqlx::query_as(
            r"
            SELECT id, first_name, last_name, slug, photo_url, phone, email
            FROM agent
            WHERE agency_id = $1
            ORDER BY last_name, first_name, id
            ",
        )
        .bind(agency_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Insert an agent under an already-available slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug was taken concurrently.
    /// Returns `RepositoryError::NotFound` if `agency_id` does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, fields: &AgentFields, slug: &Slug) -> Result<Agent, RepositoryError> {
        let row: AgentRow = sqlx::query_as(&format!(
            r"
            INSERT INTO agent (first_name, last_name, slug, email, phone, photo_url, city,
                               zip_code, secondary_sector, facebook_url, instagram_url,
                               linkedin_url, bio, agency_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {AGENT_COLUMNS}
            "
        ))
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(slug)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.photo_url)
        .bind(&fields.city)
        .bind(&fields.zip_code)
        .bind(&fields.secondary_sector)
        .bind(&fields.facebook_url)
        .bind(&fields.instagram_url)
        .bind(&fields.linkedin_url)
        .bind(&fields.bio)
        .bind(fields.agency_id)
        .fetch_one(self.pool)
        .await
        .map_err(map_write_error)?;

        row.try_into()
    }

    /// Overwrite an agent's attributes and slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the agent (or the referenced
    /// agency) does not exist.
    /// Returns `RepositoryError::Conflict` if the slug was taken concurrently.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: AgentId,
        fields: &AgentFields,
        slug: &Slug,
    ) -> Result<Agent, RepositoryError> {
        let row: Option<AgentRow> = sqlx::query_as(&format!(
            r"
            UPDATE agent
            SET first_name = $2, last_name = $3, slug = $4, email = $5, phone = $6,
                photo_url = $7, city = $8, zip_code = $9, secondary_sector = $10,
                facebook_url = $11, instagram_url = $12, linkedin_url = $13, bio = $14,
                agency_id = $15, updated_at = NOW()
            WHERE id = $1
            RETURNING {AGENT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(slug)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.photo_url)
        .bind(&fields.city)
        .bind(&fields.zip_code)
        .bind(&fields.secondary_sector)
        .bind(&fields.facebook_url)
        .bind(&fields.instagram_url)
        .bind(&fields.linkedin_url)
        .bind(&fields.bio)
        .bind(fields.agency_id)
        .fetch_optional(self.pool)
        .await
        .map_err(map_write_error)?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete an agent. Agencies it managed lose their manager and its
    /// visit counters are removed with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the agent doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: AgentId) -> Result<Agent, RepositoryError> {
        let row: Option<AgentRow> = sqlx::query_as(&format!(
            "DELETE FROM agent WHERE id = $1 RETURNING {AGENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Number of agents.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agent")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
