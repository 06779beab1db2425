//! Activity log writer.

use sqlx::PgPool;

use vitrine_core::{ActivityAction, ActivityEntity, ActivityStatus};

use super::ActionError;
use crate::db::ActivityLogRepository;
use crate::models::NewActivity;

/// Appends rows to the activity log.
///
/// Logging never fails the action being logged: a write error is reported
/// through `tracing` and swallowed.
pub struct ActivityLogger<'a> {
    pool: &'a PgPool,
}

impl<'a> ActivityLogger<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append one row.
    pub async fn record(
        &self,
        author: &str,
        action: ActivityAction,
        entity: ActivityEntity,
        details: &str,
        status: ActivityStatus,
        error: Option<String>,
    ) {
        let entry = NewActivity {
            action,
            entity,
            details: details.to_string(),
            status,
            error,
            author: author.to_string(),
        };

        if let Err(e) = ActivityLogRepository::new(self.pool).append(&entry).await {
            tracing::error!(
                error = %e,
                action = %action,
                entity = %entity,
                details = %details,
                "Failed to write activity log"
            );
        }
    }

    /// Append the row describing `outcome`.
    pub async fn outcome<T>(
        &self,
        author: &str,
        action: ActivityAction,
        entity: ActivityEntity,
        details: &str,
        outcome: &Result<T, ActionError>,
    ) {
        let (status, error) = match outcome {
            Ok(_) => (ActivityStatus::Success, None),
            Err(e) => {
                if let ActionError::Technical(raw) = e {
                    tracing::error!(
                        error = %raw,
                        action = %action,
                        entity = %entity,
                        details = %details,
                        "Action failed"
                    );
                }
                (ActivityStatus::Failure, Some(e.log_message()))
            }
        };

        self.record(author, action, entity, details, status, error)
            .await;
    }
}
