//! Activity log repository. Append and read only.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vitrine_core::{ActivityAction, ActivityEntity, ActivityLogId, ActivityStatus};

use super::RepositoryError;
use crate::models::{ActivityEntry, ActivityPage, NewActivity};

#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: i32,
    action: ActivityAction,
    entity: ActivityEntity,
    details: String,
    status: ActivityStatus,
    error: Option<String>,
    author: String,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for ActivityEntry {
    fn from(row: ActivityRow) -> Self {
        Self {
            id: ActivityLogId::new(row.id),
            action: row.action,
            entity: row.entity,
            details: row.details,
            status: row.status,
            error: row.error,
            author: row.author,
            created_at: row.created_at,
        }
    }
}

/// Repository for the activity log.
pub struct ActivityLogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ActivityLogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append one entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn append(&self, entry: &NewActivity) -> Result<ActivityEntry, RepositoryError> {
        let row: ActivityRow = sqlx::query_as(
            r"
            INSERT INTO activity_log (action, entity, details, status, error, author)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, action, entity, details, status, error, author, created_at
            ",
        )
        .bind(entry.action)
        .bind(entry.entity)
        .bind(&entry.details)
        .bind(entry.status)
        .bind(&entry.error)
        .bind(&entry.author)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// One page of entries, newest first, with the total row count.
    ///
    /// `page` is 1-based; 0 is treated as 1.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn page(&self, page: u32, per_page: u32) -> Result<ActivityPage, RepositoryError> {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let offset = i64::from(page - 1) * i64::from(per_page);

        let rows_query = sqlx::query_as::<_, ActivityRow>(
            r"
            SELECT id, action, entity, details, status, error, author, created_at
            FROM activity_log
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(i64::from(per_page))
        .bind(offset)
        .fetch_all(self.pool);
        let count_query =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM activity_log").fetch_one(self.pool);

        let (rows, total) = tokio::try_join!(rows_query, count_query)?;

        Ok(ActivityPage {
            entries: rows.into_iter().map(Into::into).collect(),
            page,
            per_page,
            total,
        })
    }
}
