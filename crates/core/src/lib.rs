//! Vitrine Core - Shared types library.
//!
//! This crate provides the domain types used across the Vitrine workspace:
//! - `server` - Tenant microsites, visit tracking and the admin dashboard
//! - `cli` - Migrations, admin bootstrap and demo data
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. With the `postgres` feature the types also bind to
//! `sqlx` queries.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, slugs, roles and activity-log enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
