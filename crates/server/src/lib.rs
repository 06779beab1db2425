//! Vitrine server library.
//!
//! Serves one public page per real-estate agent and agency, addressed by slug
//! or by subdomain, counts their visits, and hosts the admin dashboard used to
//! manage agents, agencies and the admin team.
//!
//! Everything the binary wires together lives here so the integration tests
//! can build the same router against a test database.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
