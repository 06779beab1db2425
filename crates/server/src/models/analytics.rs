//! Visit counter types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use vitrine_core::TenantRef;

/// One per-day visit counter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    pub id: i32,
    pub day: NaiveDate,
    pub tenant: TenantRef,
    pub visits: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
