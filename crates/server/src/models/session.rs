//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use vitrine_core::{AdminId, AdminRole, Email};

use super::Admin;

/// Identity asserted by the identity provider, stored in the session after
/// the callback verified its token.
///
/// Holding an identity does not grant dashboard access on its own; the
/// email must also belong to an admin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthIdentity {
    /// Lowercased email claim.
    pub email: Email,
    /// Display name claim, when the provider sends one.
    pub name: Option<String>,
}

/// The admin behind the current request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: AdminId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
}

impl From<Admin> for CurrentAdmin {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email,
            name: admin.name,
            role: admin.role,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for the verified [`super::AuthIdentity`].
    pub const AUTH_IDENTITY: &str = "auth_identity";
}
