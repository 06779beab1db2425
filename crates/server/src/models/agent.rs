//! Agent domain types.

use chrono::{DateTime, Utc};

use vitrine_core::{AgencyId, AgentId, Email, Slug};

/// A real-estate agent with a public microsite.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub first_name: String,
    pub last_name: String,
    pub slug: Slug,
    pub email: Email,
    pub phone: String,
    pub photo_url: Option<String>,
    pub city: String,
    pub zip_code: String,
    pub secondary_sector: Option<String>,
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub bio: Option<String>,
    pub agency_id: Option<AgencyId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// "First Last", as shown on the microsite and used for the slug.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether any social profile link is set.
    #[must_use]
    pub const fn has_social_links(&self) -> bool {
        self.facebook_url.is_some() || self.instagram_url.is_some() || self.linkedin_url.is_some()
    }
}

/// Row of the dashboard agent table.
#[derive(Debug, Clone)]
pub struct AgentListItem {
    pub agent: Agent,
    /// Name of the agency the agent belongs to, if any.
    pub agency_name: Option<String>,
}

/// Validated agent attributes, as written by create and update.
#[derive(Debug, Clone)]
pub struct AgentFields {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub photo_url: Option<String>,
    pub city: String,
    pub zip_code: String,
    pub secondary_sector: Option<String>,
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub bio: Option<String>,
    pub agency_id: Option<AgencyId>,
}

impl AgentFields {
    /// The name the slug is derived from.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
