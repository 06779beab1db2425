//! Dashboard form payloads.
//!
//! Forms arrive URL-encoded. Missing fields default to empty strings and
//! blank optional fields become `None`; values are trimmed before
//! validation.

use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationError, ValidationErrors};

use vitrine_core::{AdminRole, AgencyId, AgentId, Email};

use crate::models::{AgencyFields, AgentFields};
use crate::services::ActionError;

/// Deserialize blank strings as `None` and parse the rest.
pub(crate) fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// HTML checkboxes are absent when unchecked and `on` when checked.
fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.is_some_and(|v| !matches!(v.trim(), "" | "off" | "false" | "0")))
}

fn trim(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

fn invalid(errors: &ValidationErrors) -> ActionError {
    let mut fields: Vec<String> = errors
        .field_errors()
        .keys()
        .map(ToString::to_string)
        .collect();
    fields.sort();
    ActionError::Invalid(fields.join(", "))
}

fn parse_email(value: &str) -> Result<Email, ActionError> {
    Email::parse_normalized(value).map_err(|_| ActionError::Invalid("email".to_string()))
}

/// Select boxes post row ids as text.
fn numeric_id(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<i32>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("numeric_id"))
}

/// An unset role means the default one.
fn known_role(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.parse::<AdminRole>().is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new("known_role"))
    }
}

fn parse_id<T: From<i32>>(value: Option<&str>, field: &str) -> Result<Option<T>, ActionError> {
    value
        .map(str::parse::<i32>)
        .transpose()
        .map(|id| id.map(T::from))
        .map_err(|_| ActionError::Invalid(field.to_string()))
}

/// Agent create/edit form.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct AgentForm {
    #[validate(length(min = 2))]
    pub first_name: String,
    #[validate(length(min = 2))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub phone: String,
    #[serde(deserialize_with = "empty_string_as_none")]
    #[validate(url)]
    pub photo_url: Option<String>,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub zip_code: String,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub secondary_sector: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    #[validate(url)]
    pub facebook_url: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    #[validate(url)]
    pub instagram_url: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    #[validate(url)]
    pub linkedin_url: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub bio: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    #[validate(custom(function = "numeric_id"))]
    pub agency_id: Option<String>,
}

impl AgentForm {
    /// Name used in activity log details, valid or not.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    /// Validate and convert into repository fields.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Invalid` naming the failing fields.
    pub fn into_fields(mut self) -> Result<AgentFields, ActionError> {
        for field in [
            &mut self.first_name,
            &mut self.last_name,
            &mut self.email,
            &mut self.phone,
            &mut self.city,
            &mut self.zip_code,
        ] {
            trim(field);
        }
        self.validate().map_err(|e| invalid(&e))?;

        Ok(AgentFields {
            email: parse_email(&self.email)?,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            photo_url: self.photo_url,
            city: self.city,
            zip_code: self.zip_code,
            secondary_sector: self.secondary_sector,
            facebook_url: self.facebook_url,
            instagram_url: self.instagram_url,
            linkedin_url: self.linkedin_url,
            bio: self.bio,
            agency_id: parse_id::<AgencyId>(self.agency_id.as_deref(), "agency_id")?,
        })
    }
}

/// Agency create/edit form.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct AgencyForm {
    #[validate(length(min = 2))]
    pub name: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub zip_code: String,
    #[validate(length(min = 6))]
    pub phone: String,
    #[validate(email)]
    pub email: String,
    #[serde(deserialize_with = "empty_string_as_none")]
    #[validate(custom(function = "numeric_id"))]
    pub manager_id: Option<String>,
}

impl AgencyForm {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.trim()
    }

    /// Validate and convert into repository fields.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Invalid` naming the failing fields.
    pub fn into_fields(mut self) -> Result<AgencyFields, ActionError> {
        for field in [
            &mut self.name,
            &mut self.address,
            &mut self.city,
            &mut self.zip_code,
            &mut self.phone,
            &mut self.email,
        ] {
            trim(field);
        }
        self.validate().map_err(|e| invalid(&e))?;

        Ok(AgencyFields {
            email: parse_email(&self.email)?,
            name: self.name,
            address: self.address,
            city: self.city,
            zip_code: self.zip_code,
            phone: self.phone,
            manager_id: parse_id::<AgentId>(self.manager_id.as_deref(), "manager_id")?,
        })
    }
}

/// Add-admin form.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct AdminForm {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 2))]
    pub name: String,
    #[validate(custom(function = "known_role"))]
    pub role: String,
    /// Send the new admin a welcome email.
    #[serde(deserialize_with = "checkbox")]
    pub notify: bool,
}

/// A validated [`AdminForm`].
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub notify: bool,
}

impl AdminForm {
    /// Validate and normalize (lowercased email, trimmed name).
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Invalid` naming the failing fields.
    pub fn into_new_admin(mut self) -> Result<NewAdmin, ActionError> {
        trim(&mut self.email);
        trim(&mut self.name);
        trim(&mut self.role);
        self.validate().map_err(|e| invalid(&e))?;

        let role = if self.role.is_empty() {
            AdminRole::default()
        } else {
            self.role
                .parse()
                .map_err(|_| ActionError::Invalid("role".to_string()))?
        };

        Ok(NewAdmin {
            email: parse_email(&self.email)?,
            name: self.name,
            role,
            notify: self.notify,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn agent_form(body: &str) -> AgentForm {
        serde_urlencoded::from_str(body).unwrap()
    }

    #[test]
    fn test_valid_agent_form_converts() {
        let form = agent_form(
            "first_name=+Paul+&last_name=Durand&email=Paul.Durand%40Example.fr\
             &phone=0601020304&city=Lyon&zip_code=69001&photo_url=\
             &facebook_url=https%3A%2F%2Ffacebook.com%2Fpaul&agency_id=",
        );

        let fields = form.into_fields().unwrap();
        assert_eq!(fields.first_name, "Paul");
        assert_eq!(fields.email.as_str(), "paul.durand@example.fr");
        assert_eq!(fields.photo_url, None);
        assert_eq!(fields.agency_id, None);
        assert_eq!(
            fields.facebook_url.as_deref(),
            Some("https://facebook.com/paul")
        );
    }

    #[test]
    fn test_agent_form_reports_invalid_fields() {
        let form = agent_form(
            "first_name=P&last_name=Durand&email=not-an-email&phone=0601020304\
             &city=Lyon&zip_code=69001&linkedin_url=nope",
        );

        match form.into_fields() {
            Err(ActionError::Invalid(fields)) => {
                assert_eq!(fields, "email, first_name, linkedin_url");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_agent_fields_are_invalid_not_rejected() {
        let form = agent_form("");
        assert!(matches!(form.into_fields(), Err(ActionError::Invalid(_))));
    }

    #[test]
    fn test_agent_form_parses_agency_id() {
        let form = agent_form(
            "first_name=Paul&last_name=Durand&email=paul%40example.fr\
             &phone=0601020304&city=Lyon&zip_code=69001&agency_id=7",
        );
        assert_eq!(form.into_fields().unwrap().agency_id, Some(AgencyId::new(7)));
    }

    #[test]
    fn test_agency_form_requires_phone_length() {
        let form: AgencyForm = serde_urlencoded::from_str(
            "name=Immo+Centre&address=1+rue+de+la+Paix&city=Paris&zip_code=75002\
             &phone=123&email=contact%40immo-centre.fr&manager_id=",
        )
        .unwrap();

        match form.into_fields() {
            Err(ActionError::Invalid(fields)) => assert_eq!(fields, "phone"),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_admin_form_checkbox_and_role() {
        let form: AdminForm = serde_urlencoded::from_str(
            "email=Claire%40Vitrine-Immo.fr&name=Claire+Martin&role=super&notify=on",
        )
        .unwrap();
        let admin = form.into_new_admin().unwrap();
        assert_eq!(admin.email.as_str(), "claire@vitrine-immo.fr");
        assert_eq!(admin.role, AdminRole::Super);
        assert!(admin.notify);

        let form: AdminForm =
            serde_urlencoded::from_str("email=paul%40vitrine-immo.fr&name=Paul").unwrap();
        let admin = form.into_new_admin().unwrap();
        assert_eq!(admin.role, AdminRole::Standard);
        assert!(!admin.notify);
    }

    #[test]
    fn test_non_numeric_ids_are_invalid_fields() {
        let form = agent_form(
            "first_name=Paul&last_name=Durand&email=paul%40example.fr\
             &phone=0601020304&city=Lyon&zip_code=69001&agency_id=abc",
        );
        match form.into_fields() {
            Err(ActionError::Invalid(fields)) => assert_eq!(fields, "agency_id"),
            other => panic!("expected Invalid, got {other:?}"),
        }

        let form: AgencyForm = serde_urlencoded::from_str(
            "name=Immo+Centre&address=1+rue+de+la+Paix&city=Paris&zip_code=75002\
             &phone=0102030405&email=contact%40immo-centre.fr&manager_id=12x",
        )
        .unwrap();
        match form.into_fields() {
            Err(ActionError::Invalid(fields)) => assert_eq!(fields, "manager_id"),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_role_is_an_invalid_field() {
        let form: AdminForm =
            serde_urlencoded::from_str("email=paul%40vitrine-immo.fr&name=Paul&role=root")
                .unwrap();
        match form.into_new_admin() {
            Err(ActionError::Invalid(fields)) => assert_eq!(fields, "role"),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }
}
