//! Authentication: the session token record, the token manager that keeps it
//! fresh, the session context that owns it, and its persistence.
//!
//! - `SessionToken`: access/refresh pair, expiry and identity claims
//! - `SessionManager`: single-flight refresh with a 60 second expiry skew
//! - `SessionContext`: the live session, observable and persisted
//! - `SessionStore`: session file sealed with the session secret
//! - `CredentialStore`: remembered passwords in the OS keychain

pub mod context;
pub mod credentials;
pub mod manager;
pub mod store;
pub mod token;

pub use context::SessionContext;
pub use credentials::CredentialStore;
pub use manager::SessionManager;
pub use store::SessionStore;
pub use token::{
    access_token_expires_at, decode_expiry_claim, Principal, RefreshGrant, SessionToken,
    TokenError,
};

/// Wall clock in epoch milliseconds.
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
