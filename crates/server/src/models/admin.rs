//! Admin domain types.

use chrono::{DateTime, Utc};

use vitrine_core::{AdminId, AdminRole, Email};

/// A dashboard administrator.
///
/// Admins authenticate through the identity provider. This row only grants
/// access: an identity whose email has no matching admin is turned away.
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: AdminId,
    /// Always lowercase.
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
