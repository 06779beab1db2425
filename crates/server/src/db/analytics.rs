//! Visit counter repository.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use vitrine_core::{AgencyId, AgentId, TenantRef};

use super::{RepositoryError, foreign_key_violation};
use crate::models::VisitRecord;

#[derive(Debug, sqlx::FromRow)]
struct VisitRow {
    id: i32,
    day: NaiveDate,
    agent_id: Option<i32>,
    agency_id: Option<i32>,
    visits: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VisitRow> for VisitRecord {
    type Error = RepositoryError;

    fn try_from(row: VisitRow) -> Result<Self, Self::Error> {
        let tenant = TenantRef::from_parts(
            row.agent_id.map(AgentId::new),
            row.agency_id.map(AgencyId::new),
        )
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "analytics row {} must reference exactly one tenant",
                row.id
            ))
        })?;

        Ok(Self {
            id: row.id,
            day: row.day,
            tenant,
            visits: row.visits,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for per-day visit counters.
pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count one visit for `tenant` on `day`.
    ///
    /// A single upsert: the first visit of the day inserts a row at 1, later
    /// ones increment it in place, so concurrent visits never lose updates.
    /// Returns the day's count after this visit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the tenant does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn record_visit(
        &self,
        tenant: TenantRef,
        day: NaiveDate,
    ) -> Result<i32, RepositoryError> {
        let query = match tenant {
            TenantRef::Agent(id) => sqlx::query_scalar::<sqlx::Postgres, i32>(
                r"
                INSERT INTO analytics (day, agent_id, visits)
                VALUES ($1, $2, 1)
                ON CONFLICT (day, agent_id) WHERE agent_id IS NOT NULL
                DO UPDATE SET visits = analytics.visits + 1, updated_at = NOW()
                RETURNING visits
                ",
            )
            .bind(day)
            .bind(id),
            TenantRef::Agency(id) => sqlx::query_scalar::<sqlx::Postgres, i32>(
                r"
                INSERT INTO analytics (day, agency_id, visits)
                VALUES ($1, $2, 1)
                ON CONFLICT (day, agency_id) WHERE agency_id IS NOT NULL
                DO UPDATE SET visits = analytics.visits + 1, updated_at = NOW()
                RETURNING visits
                ",
            )
            .bind(day)
            .bind(id),
        };

        query.fetch_one(self.pool).await.map_err(|e| {
            if foreign_key_violation(&e).is_some() {
                RepositoryError::NotFound
            } else {
                RepositoryError::Database(e)
            }
        })
    }

    /// All counters for one day.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn for_day(&self, day: NaiveDate) -> Result<Vec<VisitRecord>, RepositoryError> {
        let rows: Vec<VisitRow> = sqlx::query_as(
            r"
            SELECT id, day, agent_id, agency_id, visits, created_at, updated_at
            FROM analytics
            WHERE day = $1
            ORDER BY visits DESC, id
            ",
        )
        .bind(day)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Counters since `since` (inclusive), optionally for a single tenant,
    /// oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn list(
        &self,
        tenant: Option<TenantRef>,
        since: Option<NaiveDate>,
    ) -> Result<Vec<VisitRecord>, RepositoryError> {
        let agent_id = tenant.and_then(TenantRef::agent_id);
        let agency_id = tenant.and_then(TenantRef::agency_id);

        let rows: Vec<VisitRow> = sqlx::query_as(
            r"
            SELECT id, day, agent_id, agency_id, visits, created_at, updated_at
            FROM analytics
            WHERE ($1::DATE IS NULL OR day >= $1)
              AND ($2::INTEGER IS NULL OR agent_id = $2)
              AND ($3::INTEGER IS NULL OR agency_id = $3)
            ORDER BY day, id
            ",
        )
        .bind(since)
        .bind(agent_id)
        .bind(agency_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
