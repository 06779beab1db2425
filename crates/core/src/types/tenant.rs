//! Tenant identity shared by analytics and public pages.

use serde::{Deserialize, Serialize};

use super::id::{AgencyId, AgentId};

/// The owner of a public microsite: either an agent or an agency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TenantRef {
    Agent(AgentId),
    Agency(AgencyId),
}

impl TenantRef {
    /// Build a tenant reference from a pair of optional ids.
    ///
    /// Returns `None` unless exactly one of them is set.
    #[must_use]
    pub fn from_parts(agent_id: Option<AgentId>, agency_id: Option<AgencyId>) -> Option<Self> {
        match (agent_id, agency_id) {
            (Some(id), None) => Some(Self::Agent(id)),
            (None, Some(id)) => Some(Self::Agency(id)),
            _ => None,
        }
    }

    #[must_use]
    pub const fn agent_id(self) -> Option<AgentId> {
        match self {
            Self::Agent(id) => Some(id),
            Self::Agency(_) => None,
        }
    }

    #[must_use]
    pub const fn agency_id(self) -> Option<AgencyId> {
        match self {
            Self::Agency(id) => Some(id),
            Self::Agent(_) => None,
        }
    }
}

impl std::fmt::Display for TenantRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Agent(id) => write!(f, "agent:{id}"),
            Self::Agency(id) => write!(f, "agency:{id}"),
        }
    }
}
