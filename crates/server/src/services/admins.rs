//! Admin management.
//!
//! Adding or removing an admin notifies every super admin. The role has no
//! other effect: both roles can use the whole dashboard.

use vitrine_core::{ActivityAction, ActivityEntity, AdminId};

use super::{ActionError, ActivityLogger};
use crate::db::{AdminRepository, RepositoryError};
use crate::forms::AdminForm;
use crate::models::Admin;
use crate::state::AppState;

pub const EMAIL_TAKEN: &str = "An admin with this email already exists";

/// Add and remove admins.
pub struct AdminService<'a> {
    state: &'a AppState,
}

/// What a super admin is told about.
#[derive(Debug, Clone, Copy)]
enum TeamChange {
    Added,
    Removed,
}

impl<'a> AdminService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn repo(&self) -> AdminRepository<'a> {
        AdminRepository::new(self.state.pool())
    }

    fn logger(&self) -> ActivityLogger<'a> {
        ActivityLogger::new(self.state.pool())
    }

    fn dashboard_url(&self) -> String {
        format!("{}/admin", self.state.config().base_url)
    }

    /// Add an admin.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Conflict` when the email is already an admin,
    /// `ActionError::Invalid` on validation failure and
    /// `ActionError::Technical` for anything else.
    #[tracing::instrument(skip(self, form), fields(email = %form.email))]
    pub async fn create(&self, author: &str, form: AdminForm) -> Result<Admin, ActionError> {
        let email = form.email.trim().to_lowercase();
        let mut notify = false;

        let result = match form.into_new_admin() {
            Ok(new) => {
                notify = new.notify;
                self.repo()
                    .create(&new.email, &new.name, new.role)
                    .await
                    .map_err(|e| match e {
                        RepositoryError::Conflict(_) => {
                            ActionError::Conflict(EMAIL_TAKEN.to_string())
                        }
                        other => other.into(),
                    })
            }
            Err(e) => Err(e),
        };

        let details = match &result {
            Ok(admin) => format!("Admin {} <{}> ({})", admin.name, admin.email, admin.role),
            Err(_) => format!("Admin <{email}>"),
        };
        self.logger()
            .outcome(author, ActivityAction::Create, ActivityEntity::Admin, &details, &result)
            .await;

        if let Ok(admin) = &result {
            tracing::info!(admin_id = %admin.id, "Admin added");
            self.notify_team(admin, author, TeamChange::Added).await;
            if notify {
                self.send_welcome(admin);
            }
        }
        result
    }

    /// Remove an admin.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::NotFound` if the admin does not exist and
    /// `ActionError::Technical` for anything else.
    #[tracing::instrument(skip(self), fields(admin_id = %id))]
    pub async fn delete(&self, author: &str, id: AdminId) -> Result<Admin, ActionError> {
        let result = self.repo().delete(id).await.map_err(ActionError::from);

        let details = match &result {
            Ok(admin) => format!("Admin {} <{}>", admin.name, admin.email),
            Err(_) => format!("Admin #{id}"),
        };
        self.logger()
            .outcome(author, ActivityAction::Delete, ActivityEntity::Admin, &details, &result)
            .await;

        if let Ok(admin) = &result {
            tracing::info!(admin_id = %admin.id, "Admin removed");
            self.notify_team(admin, author, TeamChange::Removed).await;
        }
        result
    }

    /// Email every super admin about a team change, in the background.
    async fn notify_team(&self, subject: &Admin, author: &str, change: TeamChange) {
        let recipients = match self.repo().list_super_admins().await {
            Ok(admins) => admins,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list super admins for notification");
                return;
            }
        };

        for recipient in recipients {
            let email = self.state.email().clone();
            let to = recipient.email.to_string();
            let name = subject.name.clone();
            let address = subject.email.to_string();
            let role = subject.role.label();
            let author = author.to_string();
            let dashboard_url = self.dashboard_url();

            tokio::spawn(async move {
                let sent = match change {
                    TeamChange::Added => {
                        email
                            .send_admin_added(&to, &name, &address, role, &author, &dashboard_url)
                            .await
                    }
                    TeamChange::Removed => {
                        email.send_admin_removed(&to, &name, &address, &author).await
                    }
                };
                if let Err(e) = sent {
                    tracing::error!(to = %to, error = %e, "Failed to send team notification");
                }
            });
        }
    }

    fn send_welcome(&self, admin: &Admin) {
        let email = self.state.email().clone();
        let to = admin.email.to_string();
        let name = admin.name.clone();
        let dashboard_url = self.dashboard_url();

        tokio::spawn(async move {
            if let Err(e) = email.send_welcome(&to, &name, &dashboard_url).await {
                tracing::error!(to = %to, error = %e, "Failed to send welcome email");
            }
        });
    }
}
