//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::middleware::tenant::TenantResolver;
use crate::services::email::{EmailError, EmailService};
use crate::services::identity::{IdentityError, IdentityVerifier};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("email service: {0}")]
    Email(#[from] EmailError),
    #[error("identity verifier: {0}")]
    Identity(#[from] IdentityError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Built once in `main`; nothing in the crate
/// reaches for a global.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: PgPool,
    email: EmailService,
    identity: IdentityVerifier,
    tenants: TenantResolver,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the email transport or the token verification key
    /// cannot be set up.
    pub fn new(config: AppConfig, pool: PgPool) -> Result<Self, StateError> {
        let email = EmailService::new(&config.email)?;
        let identity = IdentityVerifier::new(&config.auth)?;
        let tenants = TenantResolver::new(&config.tenancy);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                email,
                identity,
                tenants,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    #[must_use]
    pub fn identity(&self) -> &IdentityVerifier {
        &self.inner.identity
    }

    #[must_use]
    pub fn tenants(&self) -> &TenantResolver {
        &self.inner.tenants
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use secrecy::ExposeSecret;

    use super::*;
    use crate::config::tests::test_config;

    /// State over a pool that never connects unless a handler queries it.
    pub(crate) fn test_state() -> AppState {
        let config = test_config();
        let pool = PgPool::connect_lazy(config.database_url.expose_secret()).unwrap();
        AppState::new(config, pool).unwrap()
    }
}
