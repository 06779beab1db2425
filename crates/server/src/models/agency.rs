//! Agency domain types.

use chrono::{DateTime, Utc};

use vitrine_core::{AgencyId, AgentId, Email, Slug};

/// A real-estate agency with a public microsite.
#[derive(Debug, Clone)]
pub struct Agency {
    pub id: AgencyId,
    pub name: String,
    pub slug: Slug,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub phone: String,
    pub email: Email,
    /// Agent managing the agency. At most one agency per manager.
    pub manager_id: Option<AgentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the dashboard agency table.
#[derive(Debug, Clone)]
pub struct AgencyListItem {
    pub agency: Agency,
    pub manager_name: Option<String>,
    pub member_count: i64,
}

/// An agent listed on an agency microsite.
#[derive(Debug, Clone)]
pub struct AgencyMember {
    pub id: AgentId,
    pub full_name: String,
    pub slug: Slug,
    pub photo_url: Option<String>,
    pub phone: String,
    pub email: Email,
}

/// Validated agency attributes, as written by create and update.
#[derive(Debug, Clone)]
pub struct AgencyFields {
    pub name: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub phone: String,
    pub email: Email,
    pub manager_id: Option<AgentId>,
}
