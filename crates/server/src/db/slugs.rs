//! Slug availability across both tenant tables.

use sqlx::PgPool;

use vitrine_core::{Slug, TenantRef};

use super::{RepositoryError, agencies, agents};

/// Raised by the `enforce_shared_slug` trigger when the other tenant table
/// already uses the slug.
pub const SHARED_SLUG: &str = "tenant_slug_shared";

/// Whether a violated constraint means "this slug is already taken".
#[must_use]
pub fn is_slug_conflict(constraint: &str) -> bool {
    [agents::SLUG_UNIQUE, agencies::SLUG_UNIQUE, SHARED_SLUG].contains(&constraint)
}

/// Agents and agencies share one slug namespace; this repository answers
/// questions that span both tables.
pub struct SlugRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SlugRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether `slug` is used by any agent or agency other than `owner`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_taken(
        &self,
        slug: &Slug,
        owner: Option<TenantRef>,
    ) -> Result<bool, RepositoryError> {
        let agent_id = owner.and_then(TenantRef::agent_id).map(|id| id.as_i32());
        let agency_id = owner.and_then(TenantRef::agency_id).map(|id| id.as_i32());

        let taken: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM agent
                WHERE slug = $1 AND ($2::INTEGER IS NULL OR id <> $2)
            ) OR EXISTS (
                SELECT 1 FROM agency
                WHERE slug = $1 AND ($3::INTEGER IS NULL OR id <> $3)
            )
            ",
        )
        .bind(slug)
        .bind(agent_id)
        .bind(agency_id)
        .fetch_one(self.pool)
        .await?;

        Ok(taken)
    }

    /// Which tenant owns `slug`, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn owner(&self, slug: &Slug) -> Result<Option<TenantRef>, RepositoryError> {
        let row: Option<(Option<i32>, Option<i32>)> = sqlx::query_as(
            r"
            SELECT id AS agent_id, NULL::INTEGER AS agency_id FROM agent WHERE slug = $1
            UNION ALL
            SELECT NULL::INTEGER, id FROM agency WHERE slug = $1
            LIMIT 1
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.and_then(|(agent_id, agency_id)| {
            TenantRef::from_parts(agent_id.map(Into::into), agency_id.map(Into::into))
        }))
    }
}
