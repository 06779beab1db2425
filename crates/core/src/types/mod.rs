//! Core types for Vitrine.
//!
//! Type-safe wrappers for the platform's domain concepts.

pub mod email;
pub mod id;
pub mod slug;
pub mod status;
pub mod tenant;

pub use email::{Email, EmailError};
pub use id::*;
pub use slug::{Slug, SlugError};
pub use status::*;
pub use tenant::TenantRef;
