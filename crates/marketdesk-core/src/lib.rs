//! Client library for the marketdesk marketplace admin API.
//!
//! - [`auth`]: session tokens, single-flight refresh and the session context
//! - [`api`]: typed REST endpoints
//! - [`models`]: API records and chart normalization
//! - [`cache`]: JSON response cache with staleness
//! - [`config`]: environment settings and saved preferences

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod utils;

#[cfg(test)]
mod testutil;

pub use api::{requires_login, AdminClient, ApiError, AuthApi};
pub use auth::{CredentialStore, SessionContext, SessionManager, SessionStore, SessionToken};
pub use cache::CacheManager;
pub use config::{Config, Settings};
