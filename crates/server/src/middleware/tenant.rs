//! Host-based tenant routing.
//!
//! Every agent and agency site is reachable on its own subdomain
//! (`paul-durand.vitrine-immo.fr`). [`TenantResolver`] turns a `Host` header
//! into a tenant key and [`tenant_rewrite`] rewrites the request path to
//! `/sites/{key}{path}` before routing. Whether the key belongs to anyone is
//! decided later by the site handler.

use std::net::IpAddr;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Uri, header::HOST, uri::PathAndQuery},
    middleware::Next,
    response::Response,
};

use crate::config::TenancyConfig;

/// Wildcard-DNS services that resolve any subdomain to a local address.
const DEV_SUFFIXES: &[&str] = &[".lvh.me", ".localtest.me", ".nip.io", ".sslip.io"];

/// Suffixes that embed the target IP in the hostname.
const IP_SUFFIXES: &[&str] = &[".nip.io", ".sslip.io"];

/// Path prefixes served identically on every host.
const EXCLUDED_PREFIXES: &[&str] = &["/static", "/api", "/health"];

/// Subdomain labels that never name a tenant.
const RESERVED_LABELS: &[&str] = &["www", "localhost", "admin", "api"];

/// Resolves `Host` headers to tenant keys.
#[derive(Debug, Clone)]
pub struct TenantResolver {
    root_domain: String,
    reserved: Vec<String>,
}

impl TenantResolver {
    #[must_use]
    pub fn new(config: &TenancyConfig) -> Self {
        let mut reserved: Vec<String> = RESERVED_LABELS.iter().map(|s| (*s).to_string()).collect();
        reserved.push(config.platform_name.to_ascii_lowercase());
        if let Some(first) = config.root_domain.split('.').next() {
            reserved.push(first.to_ascii_lowercase());
        }

        Self {
            root_domain: config.root_domain.to_ascii_lowercase(),
            reserved,
        }
    }

    /// The tenant key addressed by `host`, if any.
    ///
    /// ```text
    /// paul-durand.vitrine-immo.fr     -> Some("paul-durand")
    /// paul-durand.localhost:3000      -> Some("paul-durand")
    /// paul-durand.lvh.me              -> Some("paul-durand")
    /// paul-durand.127.0.0.1.nip.io    -> Some("paul-durand")
    /// www.vitrine-immo.fr             -> None
    /// vitrine-immo.fr                 -> None
    /// localhost:3000                  -> None
    /// ```
    #[must_use]
    pub fn resolve(&self, host: &str) -> Option<String> {
        let host = normalize_host(host)?;

        if host == self.root_domain || host.parse::<IpAddr>().is_ok() {
            return None;
        }

        let mut labels = host.split('.');
        let key = labels.next().filter(|k| !k.is_empty())?;
        // A bare label (e.g. `localhost`) is never a tenant
        labels.next()?;

        if self.is_reserved(key) {
            return None;
        }

        Some(key.to_string())
    }

    /// Whether `label` can never address a tenant. Slug allocation treats
    /// these as taken.
    #[must_use]
    pub fn is_reserved(&self, label: &str) -> bool {
        self.reserved.iter().any(|r| r == label)
    }
}

/// Lowercase, strip the port and fold dev wildcard-DNS suffixes into
/// `.localhost`.
fn normalize_host(host: &str) -> Option<String> {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    let host = match host.rsplit_once(':') {
        Some((name, port)) if port.bytes().all(|b| b.is_ascii_digit()) => name.to_string(),
        _ => host,
    };
    if host.is_empty() {
        return None;
    }

    for suffix in DEV_SUFFIXES {
        // The wildcard service's own apex is the dev root host
        if suffix.strip_prefix('.') == Some(host.as_str()) {
            return Some("localhost".to_string());
        }
        if let Some(prefix) = host.strip_suffix(suffix) {
            let prefix = if IP_SUFFIXES.contains(suffix) {
                strip_embedded_ip(prefix)
            } else {
                prefix.to_string()
            };
            if prefix.is_empty() {
                return None;
            }
            return Some(format!("{prefix}.localhost"));
        }
    }

    Some(host)
}

/// Drop the trailing IP labels of a `nip.io`-style name
/// (`paul.127.0.0.1` → `paul`, `paul.10-0-0-1` → `paul`).
fn strip_embedded_ip(name: &str) -> String {
    let labels: Vec<&str> = name.split('.').collect();

    for split in 0..labels.len() {
        let (head, tail) = labels.split_at(split);
        let tail = tail.join(".");
        if tail.parse::<IpAddr>().is_ok() || tail.replace('-', ".").parse::<IpAddr>().is_ok() {
            return head.join(".");
        }
    }

    name.to_string()
}

fn request_host(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(String::from)
        .or_else(|| uri.authority().map(|a| a.as_str().to_string()))
}

fn is_excluded(path: &str) -> bool {
    EXCLUDED_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Rewrite tenant-host requests to `/sites/{key}{path}`.
///
/// Must wrap the whole router so the rewritten URI is the one that gets
/// routed.
pub async fn tenant_rewrite(
    State(resolver): State<TenantResolver>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if !is_excluded(path)
        && let Some(key) = request_host(request.headers(), request.uri())
            .and_then(|host| resolver.resolve(&host))
    {
        let suffix = if path == "/" { "" } else { path };
        let rewritten = match request.uri().query() {
            Some(query) => format!("/sites/{key}{suffix}?{query}"),
            None => format!("/sites/{key}{suffix}"),
        };

        match PathAndQuery::try_from(rewritten) {
            Ok(path_and_query) => {
                let mut parts = request.uri().clone().into_parts();
                parts.path_and_query = Some(path_and_query);
                match Uri::from_parts(parts) {
                    Ok(uri) => {
                        tracing::debug!(tenant = %key, uri = %uri, "Rewrote tenant request");
                        *request.uri_mut() = uri;
                    }
                    Err(e) => tracing::warn!(tenant = %key, error = %e, "Invalid rewritten URI"),
                }
            }
            Err(e) => tracing::warn!(tenant = %key, error = %e, "Invalid rewritten path"),
        }
    }

    next.run(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, extract::Path, http::StatusCode, routing::get};
    use tower::{Layer, ServiceExt};

    use super::*;

    fn resolver() -> TenantResolver {
        TenantResolver::new(&TenancyConfig {
            root_domain: "vitrine-immo.fr".to_string(),
            platform_name: "vitrine".to_string(),
        })
    }

    #[test]
    fn test_resolve_production_subdomain() {
        assert_eq!(
            resolver().resolve("paul-durand.vitrine-immo.fr"),
            Some("paul-durand".to_string())
        );
        assert_eq!(
            resolver().resolve("Paul-Durand.Vitrine-Immo.FR:443"),
            Some("paul-durand".to_string())
        );
    }

    #[test]
    fn test_resolve_localhost_subdomain_with_port() {
        assert_eq!(
            resolver().resolve("paul-durand.localhost:3000"),
            Some("paul-durand".to_string())
        );
    }

    #[test]
    fn test_resolve_dev_wildcard_suffixes() {
        let r = resolver();
        assert_eq!(r.resolve("paul.lvh.me:3000"), Some("paul".to_string()));
        assert_eq!(r.resolve("paul.localtest.me"), Some("paul".to_string()));
        assert_eq!(r.resolve("paul.127.0.0.1.nip.io"), Some("paul".to_string()));
        assert_eq!(r.resolve("paul.10-0-0-1.sslip.io"), Some("paul".to_string()));
        assert_eq!(r.resolve("127.0.0.1.nip.io"), None);
        assert_eq!(r.resolve("lvh.me"), None);
    }

    #[test]
    fn test_dev_wildcard_apex_is_the_root_host() {
        let r = resolver();
        assert_eq!(r.resolve("lvh.me:3000"), None);
        assert_eq!(r.resolve("localtest.me"), None);
        assert_eq!(r.resolve("nip.io"), None);
        assert_eq!(r.resolve("LVH.ME."), None);
    }

    #[tokio::test]
    async fn test_dev_wildcard_apex_serves_home() {
        let (_, body) = body_of("lvh.me:3000", "/").await;
        assert_eq!(body, "home");
    }

    #[test]
    fn test_reserved_hosts_pass_through() {
        let r = resolver();
        assert_eq!(r.resolve("vitrine-immo.fr"), None);
        assert_eq!(r.resolve("www.vitrine-immo.fr"), None);
        assert_eq!(r.resolve("admin.vitrine-immo.fr"), None);
        assert_eq!(r.resolve("api.vitrine-immo.fr"), None);
        assert_eq!(r.resolve("vitrine.localhost"), None);
        assert_eq!(r.resolve("vitrine-immo.localhost"), None);
        assert_eq!(r.resolve("localhost:3000"), None);
        assert_eq!(r.resolve("127.0.0.1:3000"), None);
        assert_eq!(r.resolve(""), None);
    }

    #[test]
    fn test_excluded_paths() {
        assert!(is_excluded("/static/css/site.css"));
        assert!(is_excluded("/api/track-visit"));
        assert!(is_excluded("/health"));
        assert!(!is_excluded("/"));
        assert!(!is_excluded("/apiary"));
        assert!(!is_excluded("/contact"));
    }

    fn router() -> Router {
        Router::new()
            .route("/", get(|| async { "home" }))
            .route(
                "/sites/{slug}",
                get(|Path(slug): Path<String>| async move { format!("site:{slug}") }),
            )
            .route("/api/track-visit", get(|| async { "api" }))
    }

    async fn body_of(host: &str, uri: &str) -> (StatusCode, String) {
        let app = axum::middleware::from_fn_with_state(resolver(), tenant_rewrite).layer(router());
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header(HOST, host)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_tenant_host_is_rewritten_before_routing() {
        let (status, body) = body_of("paul-durand.localhost:3000", "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "site:paul-durand");
    }

    #[tokio::test]
    async fn test_root_host_is_not_rewritten() {
        let (_, body) = body_of("localhost:3000", "/").await;
        assert_eq!(body, "home");
    }

    #[tokio::test]
    async fn test_api_paths_are_not_rewritten_on_tenant_hosts() {
        let (_, body) = body_of("paul-durand.localhost:3000", "/api/track-visit").await;
        assert_eq!(body, "api");
    }
}
