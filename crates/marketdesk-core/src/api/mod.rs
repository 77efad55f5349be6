//! REST client for the marketplace admin API.
//!
//! [`AuthApi`] covers the unauthenticated endpoints (login, token refresh and
//! the password reset flow). [`AdminClient`] covers everything else; each
//! request takes its bearer token from the [`SessionContext`](crate::auth::SessionContext),
//! so tokens are refreshed before they expire and a dead session stops the
//! request before it is sent.
//!
//! The API wraps most answers as `{ success, message, data }`.

pub mod account;
pub mod auth;
pub mod catalog;
pub mod client;
pub mod dashboard;
pub mod error;
pub mod marketing;
pub mod members;

pub use auth::AuthApi;
pub use client::{http_client, AdminClient};
pub use error::{requires_login, ApiError};
