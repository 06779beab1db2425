//! Agent mutations.
//!
//! Each mutation writes exactly one activity row, whatever the outcome. A
//! successful create or update emails the agent the link to their site.

use vitrine_core::{ActivityAction, ActivityEntity, AgentId, TenantRef};

use super::{ActionError, ActivityLogger, slugs};
use crate::db::AgentRepository;
use crate::forms::AgentForm;
use crate::models::Agent;
use crate::state::AppState;

/// Create, update and delete agents.
pub struct AgentService<'a> {
    state: &'a AppState,
}

impl<'a> AgentService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn repo(&self) -> AgentRepository<'a> {
        AgentRepository::new(self.state.pool())
    }

    fn logger(&self) -> ActivityLogger<'a> {
        ActivityLogger::new(self.state.pool())
    }

    /// Create an agent from a submitted form.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Invalid` on validation failure,
    /// `ActionError::NotFound` if the chosen agency does not exist and
    /// `ActionError::Technical` for anything else.
    #[tracing::instrument(skip(self, form), fields(agent = %form.display_name()))]
    pub async fn create(&self, author: &str, form: AgentForm) -> Result<Agent, ActionError> {
        let name = form.display_name();
        let result = self.try_create(form).await;

        let details = match &result {
            Ok(agent) => format!("Agent {} ({})", agent.full_name(), agent.slug),
            Err(_) => format!("Agent {name}"),
        };
        self.logger()
            .outcome(author, ActivityAction::Create, ActivityEntity::Agent, &details, &result)
            .await;

        if let Ok(agent) = &result {
            tracing::info!(agent_id = %agent.id, slug = %agent.slug, "Agent created");
            self.notify_site_published(agent, true);
        }
        result
    }

    async fn try_create(&self, form: AgentForm) -> Result<Agent, ActionError> {
        let fields = form.into_fields()?;
        let repo = self.repo();
        let (repo, fields) = (&repo, &fields);

        slugs::write_with_slug(
            self.state.pool(),
            self.state.tenants(),
            &fields.full_name(),
            None,
            |slug| async move { repo.create(fields, &slug).await },
            ActionError::from,
        )
        .await
    }

    /// Update an agent. The slug is regenerated only when the first or last
    /// name changed.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::NotFound` if the agent (or its new agency) does
    /// not exist, `ActionError::Invalid` on validation failure and
    /// `ActionError::Technical` for anything else.
    #[tracing::instrument(skip(self, form), fields(agent_id = %id))]
    pub async fn update(
        &self,
        author: &str,
        id: AgentId,
        form: AgentForm,
    ) -> Result<Agent, ActionError> {
        let name = form.display_name();
        let result = self.try_update(id, form).await;

        let details = match &result {
            Ok(agent) => format!("Agent {} ({})", agent.full_name(), agent.slug),
            Err(_) => format!("Agent #{id} {name}"),
        };
        self.logger()
            .outcome(author, ActivityAction::Update, ActivityEntity::Agent, &details, &result)
            .await;

        if let Ok(agent) = &result {
            tracing::info!(agent_id = %agent.id, slug = %agent.slug, "Agent updated");
            self.notify_site_published(agent, false);
        }
        result
    }

    async fn try_update(&self, id: AgentId, form: AgentForm) -> Result<Agent, ActionError> {
        let fields = form.into_fields()?;
        let current = self.repo().get(id).await?.ok_or(ActionError::NotFound)?;

        let renamed =
            current.first_name != fields.first_name || current.last_name != fields.last_name;
        let repo = self.repo();
        let (repo, fields) = (&repo, &fields);
        if !renamed {
            return Ok(repo.update(id, fields, &current.slug).await?);
        }

        slugs::write_with_slug(
            self.state.pool(),
            self.state.tenants(),
            &fields.full_name(),
            Some(TenantRef::Agent(id)),
            |slug| async move { repo.update(id, fields, &slug).await },
            ActionError::from,
        )
        .await
    }

    /// Delete an agent.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::NotFound` if the agent does not exist and
    /// `ActionError::Technical` for anything else.
    #[tracing::instrument(skip(self), fields(agent_id = %id))]
    pub async fn delete(&self, author: &str, id: AgentId) -> Result<Agent, ActionError> {
        let result = self.repo().delete(id).await.map_err(ActionError::from);

        let details = match &result {
            Ok(agent) => format!("Agent {} ({})", agent.full_name(), agent.slug),
            Err(_) => format!("Agent #{id}"),
        };
        self.logger()
            .outcome(author, ActivityAction::Delete, ActivityEntity::Agent, &details, &result)
            .await;

        if result.is_ok() {
            tracing::info!(agent_id = %id, "Agent deleted");
        }
        result
    }

    /// Send the agent their site link in the background.
    fn notify_site_published(&self, agent: &Agent, created: bool) {
        let email = self.state.email().clone();
        let to = agent.email.to_string();
        let name = agent.full_name();
        let site_url = self.state.config().tenant_url(agent.slug.as_str());

        tokio::spawn(async move {
            if let Err(e) = email.send_site_published(&to, &name, &site_url, created).await {
                tracing::error!(to = %to, error = %e, "Failed to send site link");
            }
        });
    }
}

