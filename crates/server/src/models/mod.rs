//! Domain models for the server.
//!
//! These are the validated shapes handlers and templates work with. Raw
//! database rows live next to their repositories in [`crate::db`] and are
//! converted into these types there.

pub mod activity;
pub mod admin;
pub mod agency;
pub mod agent;
pub mod analytics;
pub mod session;

pub use activity::{ActivityEntry, ActivityPage, NewActivity};
pub use admin::Admin;
pub use agency::{Agency, AgencyFields, AgencyListItem, AgencyMember};
pub use agent::{Agent, AgentFields, AgentListItem};
pub use analytics::VisitRecord;
pub use session::{AuthIdentity, CurrentAdmin, keys as session_keys};

pub use vitrine_core::{ActivityAction, ActivityEntity, ActivityStatus, AdminRole};
