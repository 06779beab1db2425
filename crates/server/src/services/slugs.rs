//! Slug allocation.
//!
//! Agents and agencies share one slug namespace. A name's base slug is used
//! when free; otherwise a random `-0..=9999` suffix is drawn until a free one
//! turns up, giving up after [`MAX_SUFFIX_DRAWS`] draws. Labels the tenant
//! resolver reserves (`www`, `admin`, the platform name...) count as taken,
//! so every allocated slug is reachable as a subdomain.

use std::future::Future;

use rand::Rng;
use sqlx::PgPool;

use vitrine_core::{Slug, TenantRef};

use super::ActionError;
use crate::db::slugs::is_slug_conflict;
use crate::db::{RepositoryError, SlugRepository};
use crate::middleware::tenant::TenantResolver;

pub const MAX_SUFFIX_DRAWS: usize = 20;

/// Writes attempted before a lost slug race becomes a technical error.
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// The first free candidate: `base`, then random suffixes.
///
/// # Errors
///
/// Returns `ActionError::Technical` when every draw collides or the
/// availability check fails.
pub async fn first_free<F, Fut>(
    base: &Slug,
    tenants: &TenantResolver,
    mut is_taken: F,
) -> Result<Slug, ActionError>
where
    F: FnMut(Slug) -> Fut,
    Fut: Future<Output = Result<bool, RepositoryError>>,
{
    if !tenants.is_reserved(base.as_str()) && !is_taken(base.clone()).await? {
        return Ok(base.clone());
    }

    for _ in 0..MAX_SUFFIX_DRAWS {
        let suffix: u16 = rand::rng().random_range(0..=9999);
        let candidate = base.with_suffix(suffix);
        if !is_taken(candidate.clone()).await? {
            return Ok(candidate);
        }
    }

    Err(ActionError::Technical(format!(
        "no free slug for '{base}' after {MAX_SUFFIX_DRAWS} draws"
    )))
}

/// Allocate a slug for `name`, ignoring the row of `owner` (on updates).
///
/// # Errors
///
/// Returns `ActionError::Invalid` when the name yields no slug at all and
/// `ActionError::Technical` when no free slug was found.
pub async fn allocate(
    pool: &PgPool,
    tenants: &TenantResolver,
    name: &str,
    owner: Option<TenantRef>,
) -> Result<Slug, ActionError> {
    let base = Slug::from_name(name).map_err(|e| ActionError::Invalid(format!("slug ({e})")))?;
    let repo = SlugRepository::new(pool);
    let repo = &repo;

    first_free(&base, tenants, |candidate| async move {
        repo.is_taken(&candidate, owner).await
    })
    .await
}

/// Run `write` with a slug from `next_slug`, drawing a new one when a
/// concurrent writer claimed it between the availability check and the write.
///
/// Errors other than a slug conflict go through `map_err` unchanged.
///
/// # Errors
///
/// Returns the allocation error, the mapped write error, or
/// `ActionError::Technical` after [`MAX_WRITE_ATTEMPTS`] lost races.
pub async fn retry_slug_conflicts<T, N, NFut, W, WFut>(
    mut next_slug: N,
    mut write: W,
    map_err: impl Fn(RepositoryError) -> ActionError,
) -> Result<T, ActionError>
where
    N: FnMut() -> NFut,
    NFut: Future<Output = Result<Slug, ActionError>>,
    W: FnMut(Slug) -> WFut,
    WFut: Future<Output = Result<T, RepositoryError>>,
{
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let slug = next_slug().await?;
        match write(slug.clone()).await {
            Err(RepositoryError::Conflict(constraint)) if is_slug_conflict(&constraint) => {
                tracing::warn!(slug = %slug, attempt, "Slug claimed concurrently, drawing again");
            }
            other => return other.map_err(&map_err),
        }
    }

    Err(ActionError::Technical(format!(
        "slug still contended after {MAX_WRITE_ATTEMPTS} attempts"
    )))
}

/// Allocate a slug for `name` and write the row with it, retrying lost races.
///
/// # Errors
///
/// See [`allocate`] and [`retry_slug_conflicts`].
pub async fn write_with_slug<T, W, WFut>(
    pool: &PgPool,
    tenants: &TenantResolver,
    name: &str,
    owner: Option<TenantRef>,
    write: W,
    map_err: impl Fn(RepositoryError) -> ActionError,
) -> Result<T, ActionError>
where
    W: FnMut(Slug) -> WFut,
    WFut: Future<Output = Result<T, RepositoryError>>,
{
    retry_slug_conflicts(|| allocate(pool, tenants, name, owner), write, map_err).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::config::TenancyConfig;
    use crate::db::{agencies, agents};

    fn slug(s: &str) -> Slug {
        Slug::parse(s).unwrap()
    }

    fn tenants() -> TenantResolver {
        TenantResolver::new(&TenancyConfig {
            root_domain: "vitrine-immo.fr".to_string(),
            platform_name: "vitrine".to_string(),
        })
    }

    fn suffix_of(result: &Slug, base: &str) -> u16 {
        result
            .as_str()
            .strip_prefix(&format!("{base}-"))
            .unwrap()
            .parse::<u16>()
            .unwrap()
    }

    #[tokio::test]
    async fn test_free_base_is_used_as_is() {
        let base = slug("paul-durand");
        let result = first_free(&base, &tenants(), |_| async { Ok(false) })
            .await
            .unwrap();
        assert_eq!(result, base);
    }

    #[tokio::test]
    async fn test_taken_base_gets_numeric_suffix() {
        let base = slug("paul-durand");
        let taken: HashSet<Slug> = [base.clone()].into_iter().collect();
        let taken = &taken;

        let result = first_free(&base, &tenants(), |c| async move { Ok(taken.contains(&c)) })
            .await
            .unwrap();

        assert!(suffix_of(&result, "paul-durand") <= 9999);
    }

    #[tokio::test]
    async fn test_reserved_labels_get_a_suffix() {
        let tenants = tenants();

        for name in ["Admin", "API", "Www", "Vitrine", "Vitrine Immo", "localhost"] {
            let base = Slug::from_name(name).unwrap();
            let result = first_free(&base, &tenants, |_| async { Ok(false) })
                .await
                .unwrap();

            assert!(suffix_of(&result, base.as_str()) <= 9999);
            let host = format!("{result}.vitrine-immo.fr");
            assert_eq!(tenants.resolve(&host), Some(result.to_string()));
        }
    }

    #[tokio::test]
    async fn test_gives_up_after_max_draws() {
        let base = slug("paul-durand");
        let mut calls = 0;

        let result = first_free(&base, &tenants(), |_| {
            calls += 1;
            async { Ok(true) }
        })
        .await;

        assert!(matches!(result, Err(ActionError::Technical(_))));
        assert_eq!(calls, MAX_SUFFIX_DRAWS + 1);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_technical() {
        let base = slug("paul-durand");
        let result = first_free(&base, &tenants(), |_| async {
            Err(RepositoryError::DataCorruption("bad".to_string()))
        })
        .await;
        assert!(matches!(result, Err(ActionError::Technical(_))));
    }

    #[tokio::test]
    async fn test_lost_slug_race_draws_again() {
        let mut drawn = 0;
        let mut written = Vec::new();

        let result = retry_slug_conflicts(
            || {
                drawn += 1;
                let candidate = slug(&format!("paul-durand-{drawn}"));
                async move { Ok(candidate) }
            },
            |candidate| {
                written.push(candidate.clone());
                let first = written.len() == 1;
                async move {
                    if first {
                        Err(RepositoryError::Conflict(agents::SLUG_UNIQUE.to_string()))
                    } else {
                        Ok(candidate)
                    }
                }
            },
            ActionError::from,
        )
        .await
        .unwrap();

        assert_eq!(result.as_str(), "paul-durand-2");
        assert_eq!(written.len(), 2);
    }

    #[tokio::test]
    async fn test_persistent_slug_races_become_technical() {
        let mut writes = 0;

        let result: Result<(), _> = retry_slug_conflicts(
            || async { Ok(slug("agence-du-port")) },
            |_| {
                writes += 1;
                async { Err(RepositoryError::Conflict("tenant_slug_shared".to_string())) }
            },
            ActionError::from,
        )
        .await;

        assert!(matches!(result, Err(ActionError::Technical(_))));
        assert_eq!(writes, MAX_WRITE_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_other_conflicts_are_mapped_without_retry() {
        let mut writes = 0;

        let result: Result<(), _> = retry_slug_conflicts(
            || async { Ok(slug("agence-du-port")) },
            |_| {
                writes += 1;
                async { Err(RepositoryError::Conflict(agencies::EMAIL_UNIQUE.to_string())) }
            },
            |e| ActionError::Conflict(format!("mapped: {e}")),
        )
        .await;

        assert!(matches!(result, Err(ActionError::Conflict(_))));
        assert_eq!(writes, 1);
    }
}
