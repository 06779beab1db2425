//! HTTP middleware.
//!
//! # Order (outermost first)
//!
//! 1. Tenant rewrite (wraps the whole router, runs before routing)
//! 2. Sentry layers
//! 3. `TraceLayer`
//! 4. Request ID
//! 5. Security headers
//! 6. Session layer
//!
//! Access gating is the [`auth::RequireAdmin`] extractor rather than a layer.

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod tenant;

pub use auth::RequireAdmin;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use tenant::{TenantResolver, tenant_rewrite};
