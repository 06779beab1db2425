//! Business logic services.
//!
//! # Services
//!
//! - `action` - Outcome type shared by dashboard mutations
//! - `activity` - Activity log writer
//! - `agents`, `agencies`, `admins` - Dashboard mutations
//! - `analytics` - Visit aggregation
//! - `email` - Transactional email via an HTTP API or SMTP
//! - `identity` - Identity provider token verification
//! - `slugs` - Slug allocation across both tenant tables

pub mod action;
pub mod activity;
pub mod admins;
pub mod agencies;
pub mod agents;
pub mod analytics;
pub mod email;
pub mod identity;
pub mod slugs;

pub use action::{ActionError, SYSTEM_AUTHOR, author_name};
pub use activity::ActivityLogger;
pub use admins::AdminService;
pub use agencies::AgencyService;
pub use agents::AgentService;
pub use email::{EmailError, EmailService};
pub use identity::{IdentityError, IdentityVerifier};
