//! Outcome type shared by the dashboard mutations.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::CurrentAdmin;

/// Author recorded when no admin is attached to the action.
pub const SYSTEM_AUTHOR: &str = "System";

/// Why a create, update or delete did not happen.
///
/// `Display` is the message shown to the user. [`ActionError::log_message`]
/// is what goes into the activity log.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Form validation failed. Carries the offending field names.
    #[error("Invalid data")]
    Invalid(String),

    /// A uniqueness rule was broken.
    #[error("{0}")]
    Conflict(String),

    #[error("Not found")]
    NotFound,

    /// The row is still referenced elsewhere.
    #[error("{0}")]
    InUse(String),

    /// Anything else. Carries the raw error, never shown to the user.
    #[error("A technical error occurred")]
    Technical(String),
}

impl ActionError {
    pub fn technical(err: impl std::fmt::Display) -> Self {
        Self::Technical(err.to_string())
    }

    /// Message for the activity log `error` column.
    #[must_use]
    pub fn log_message(&self) -> String {
        match self {
            Self::Invalid(fields) => format!("Invalid data: {fields}"),
            Self::Technical(raw) => raw.clone(),
            other => other.to_string(),
        }
    }
}

impl From<RepositoryError> for ActionError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Technical(other.to_string()),
        }
    }
}

/// Name recorded as the author of an action.
#[must_use]
pub fn author_name(admin: Option<&CurrentAdmin>) -> String {
    admin.map_or_else(|| SYSTEM_AUTHOR.to_string(), |a| a.name.clone())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vitrine_core::{AdminId, AdminRole, Email};

    use super::*;

    #[test]
    fn test_user_messages_hide_technical_details() {
        let err = ActionError::Technical("connection reset by peer".to_string());
        assert_eq!(err.to_string(), "A technical error occurred");
        assert_eq!(err.log_message(), "connection reset by peer");
    }

    #[test]
    fn test_invalid_lists_fields_in_log_only() {
        let err = ActionError::Invalid("email, phone".to_string());
        assert_eq!(err.to_string(), "Invalid data");
        assert_eq!(err.log_message(), "Invalid data: email, phone");
    }

    #[test]
    fn test_repository_not_found_maps_to_not_found() {
        assert!(matches!(
            ActionError::from(RepositoryError::NotFound),
            ActionError::NotFound
        ));
        assert!(matches!(
            ActionError::from(RepositoryError::Conflict("x".to_string())),
            ActionError::Technical(_)
        ));
    }

    #[test]
    fn test_author_falls_back_to_system() {
        assert_eq!(author_name(None), "System");

        let admin = CurrentAdmin {
            id: AdminId::new(1),
            email: Email::parse("claire@vitrine-immo.fr").unwrap(),
            name: "Claire Martin".to_string(),
            role: AdminRole::Super,
        };
        assert_eq!(author_name(Some(&admin)), "Claire Martin");
    }
}
