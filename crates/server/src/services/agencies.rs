//! Agency mutations.

use vitrine_core::{ActivityAction, ActivityEntity, AgencyId, TenantRef};

use super::{ActionError, ActivityLogger, slugs};
use crate::db::{AgencyRepository, RepositoryError, agencies};
use crate::forms::AgencyForm;
use crate::models::{Agency, AgencyFields};
use crate::state::AppState;

pub const EMAIL_TAKEN: &str = "An agency with this email already exists";
pub const MANAGER_TAKEN: &str = "This agent already manages another agency";
pub const HAS_MEMBERS: &str = "Unable to delete agency: it probably contains agents";

/// Translate a write error, naming the uniqueness rule that was broken.
fn write_error(err: RepositoryError) -> ActionError {
    match err {
        RepositoryError::Conflict(constraint) if constraint == agencies::EMAIL_UNIQUE => {
            ActionError::Conflict(EMAIL_TAKEN.to_string())
        }
        RepositoryError::Conflict(constraint) if constraint == agencies::MANAGER_UNIQUE => {
            ActionError::Conflict(MANAGER_TAKEN.to_string())
        }
        RepositoryError::InUse(_) => ActionError::InUse(HAS_MEMBERS.to_string()),
        other => other.into(),
    }
}

/// Create, update and delete agencies.
pub struct AgencyService<'a> {
    state: &'a AppState,
}

impl<'a> AgencyService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn repo(&self) -> AgencyRepository<'a> {
        AgencyRepository::new(self.state.pool())
    }

    fn logger(&self) -> ActivityLogger<'a> {
        ActivityLogger::new(self.state.pool())
    }

    /// Reject emails and managers already used by another agency.
    async fn check_unique(
        &self,
        fields: &AgencyFields,
        except: Option<AgencyId>,
    ) -> Result<(), ActionError> {
        let repo = self.repo();
        if repo.email_taken(&fields.email, except).await? {
            return Err(ActionError::Conflict(EMAIL_TAKEN.to_string()));
        }
        if let Some(manager_id) = fields.manager_id
            && repo.manager_taken(manager_id, except).await?
        {
            return Err(ActionError::Conflict(MANAGER_TAKEN.to_string()));
        }
        Ok(())
    }

    /// Create an agency from a submitted form.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Conflict` when the email or manager is already
    /// used, `ActionError::Invalid` on validation failure and
    /// `ActionError::Technical` for anything else.
    #[tracing::instrument(skip(self, form), fields(agency = %form.display_name()))]
    pub async fn create(&self, author: &str, form: AgencyForm) -> Result<Agency, ActionError> {
        let name = form.display_name().to_string();
        let result = self.try_create(form).await;

        let details = match &result {
            Ok(agency) => format!("Agency {} ({})", agency.name, agency.slug),
            Err(_) => format!("Agency {name}"),
        };
        self.logger()
            .outcome(author, ActivityAction::Create, ActivityEntity::Agency, &details, &result)
            .await;

        if let Ok(agency) = &result {
            tracing::info!(agency_id = %agency.id, slug = %agency.slug, "Agency created");
        }
        result
    }

    async fn try_create(&self, form: AgencyForm) -> Result<Agency, ActionError> {
        let fields = form.into_fields()?;
        self.check_unique(&fields, None).await?;
        let repo = self.repo();
        let (repo, fields) = (&repo, &fields);

        slugs::write_with_slug(
            self.state.pool(),
            self.state.tenants(),
            &fields.name,
            None,
            |slug| async move { repo.create(fields, &slug).await },
            write_error,
        )
        .await
    }

    /// Update an agency. The slug is regenerated only when the name changed.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::NotFound` if the agency does not exist,
    /// `ActionError::Conflict` when the email or manager belongs to another
    /// agency, `ActionError::Invalid` on validation failure and
    /// `ActionError::Technical` for anything else.
    #[tracing::instrument(skip(self, form), fields(agency_id = %id))]
    pub async fn update(
        &self,
        author: &str,
        id: AgencyId,
        form: AgencyForm,
    ) -> Result<Agency, ActionError> {
        let name = form.display_name().to_string();
        let result = self.try_update(id, form).await;

        let details = match &result {
            Ok(agency) => format!("Agency {} ({})", agency.name, agency.slug),
            Err(_) => format!("Agency #{id} {name}"),
        };
        self.logger()
            .outcome(author, ActivityAction::Update, ActivityEntity::Agency, &details, &result)
            .await;

        if let Ok(agency) = &result {
            tracing::info!(agency_id = %agency.id, slug = %agency.slug, "Agency updated");
        }
        result
    }

    async fn try_update(&self, id: AgencyId, form: AgencyForm) -> Result<Agency, ActionError> {
        let fields = form.into_fields()?;
        let current = self.repo().get(id).await?.ok_or(ActionError::NotFound)?;
        self.check_unique(&fields, Some(id)).await?;

        let repo = self.repo();
        let (repo, fields) = (&repo, &fields);
        if current.name == fields.name {
            return repo
                .update(id, fields, &current.slug)
                .await
                .map_err(write_error);
        }

        slugs::write_with_slug(
            self.state.pool(),
            self.state.tenants(),
            &fields.name,
            Some(TenantRef::Agency(id)),
            |slug| async move { repo.update(id, fields, &slug).await },
            write_error,
        )
        .await
    }

    /// Delete an agency. Refused while agents still belong to it.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::InUse` when the agency still has agents,
    /// `ActionError::NotFound` if it does not exist and
    /// `ActionError::Technical` for anything else.
    #[tracing::instrument(skip(self), fields(agency_id = %id))]
    pub async fn delete(&self, author: &str, id: AgencyId) -> Result<Agency, ActionError> {
        let result = self.repo().delete(id).await.map_err(write_error);

        let details = match &result {
            Ok(agency) => format!("Agency {} ({})", agency.name, agency.slug),
            Err(_) => format!("Agency #{id}"),
        };
        self.logger()
            .outcome(author, ActivityAction::Delete, ActivityEntity::Agency, &details, &result)
            .await;

        if result.is_ok() {
            tracing::info!(agency_id = %id, "Agency deleted");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_constraints_map_to_user_messages() {
        let err = write_error(RepositoryError::Conflict(agencies::EMAIL_UNIQUE.to_string()));
        assert_eq!(err.to_string(), EMAIL_TAKEN);

        let err = write_error(RepositoryError::Conflict(agencies::MANAGER_UNIQUE.to_string()));
        assert_eq!(err.to_string(), MANAGER_TAKEN);

        let err = write_error(RepositoryError::Conflict(agencies::SLUG_UNIQUE.to_string()));
        assert!(matches!(err, ActionError::Technical(_)));
    }

    #[test]
    fn test_restricted_delete_maps_to_in_use() {
        let err = write_error(RepositoryError::InUse("agent_agency_id_fkey".to_string()));
        assert_eq!(err.to_string(), HAS_MEMBERS);
    }
}
