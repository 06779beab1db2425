//! Enumerations persisted as PostgreSQL enum types.

use serde::{Deserialize, Serialize};

/// Admin role.
///
/// Both roles can use the whole dashboard. `Super` admins additionally
/// receive team notifications when admins are added or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    #[default]
    Standard,
    Super,
}

impl AdminRole {
    /// Human label for dashboard tables.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "Admin",
            Self::Super => "Super admin",
        }
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Super => write!(f, "super"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "super" => Ok(Self::Super),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

/// Kind of mutation recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "activity_action", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Create,
    Update,
    Delete,
}

impl ActivityAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of entity touched by a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "activity_entity", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEntity {
    Agent,
    Agency,
    Admin,
}

impl ActivityEntity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Agency => "agency",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for ActivityEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a logged mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "activity_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Success,
    Failure,
}

impl ActivityStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_role_round_trips_through_str() {
        for role in [AdminRole::Standard, AdminRole::Super] {
            assert_eq!(role.to_string().parse::<AdminRole>().unwrap(), role);
        }
        assert!("viewer".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_admin_role_defaults_to_standard() {
        assert_eq!(AdminRole::default(), AdminRole::Standard);
    }

    #[test]
    fn test_activity_enums_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&ActivityAction::Delete).unwrap(),
            "\"delete\""
        );
        assert_eq!(
            serde_json::to_string(&ActivityEntity::Agency).unwrap(),
            "\"agency\""
        );
        assert_eq!(
            serde_json::to_string(&ActivityStatus::Failure).unwrap(),
            "\"failure\""
        );
    }
}
