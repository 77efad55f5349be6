//! The session token record and the pure functions that derive its expiry.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Lifetime assumed for an access token whose `exp` claim cannot be read.
pub const DEFAULT_ACCESS_TOKEN_LIFETIME_MS: i64 = 15 * 60 * 1000;

/// An access token is refreshed once it is this close to expiring.
pub const EXPIRY_SKEW_MS: i64 = 60 * 1000;

/// Terminal failure marker. Both variants mean "sign in again"; the
/// distinction only exists for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenError {
    RefreshAccessTokenError,
    MissingRefreshToken,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::RefreshAccessTokenError => write!(f, "RefreshAccessTokenError"),
            TokenError::MissingRefreshToken => write!(f, "MissingRefreshToken"),
        }
    }
}

/// Identity claims returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

/// Tokens handed back by the refresh endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub access_token_expires_at_ms: Option<i64>,
    pub principal: Principal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TokenError>,
}

impl SessionToken {
    /// Build the record created by a successful credential verification.
    pub fn issue(
        access_token: String,
        refresh_token: Option<String>,
        principal: Principal,
        now_ms: i64,
    ) -> Self {
        let expires_at = access_token_expires_at(&access_token, now_ms);
        Self {
            access_token: Some(access_token),
            refresh_token,
            access_token_expires_at_ms: Some(expires_at),
            principal,
            error: None,
        }
    }

    /// Once an error is recorded no further refresh is attempted.
    pub fn is_terminal(&self) -> bool {
        self.error.is_some()
    }

    /// True while `now` is more than [`EXPIRY_SKEW_MS`] ahead of expiry.
    /// A record without an expiry is never fresh.
    pub fn is_fresh_at(&self, now_ms: i64) -> bool {
        match self.access_token_expires_at_ms {
            Some(expires_at) => now_ms < expires_at - EXPIRY_SKEW_MS,
            None => false,
        }
    }

    /// Fill in a missing expiry from the access token's own claim.
    pub fn with_derived_expiry(mut self, now_ms: i64) -> Self {
        if self.access_token_expires_at_ms.is_none() {
            if let Some(ref access) = self.access_token {
                self.access_token_expires_at_ms = Some(access_token_expires_at(access, now_ms));
            }
        }
        self
    }

    /// Mark the record terminal. Tokens are kept so the caller can still see
    /// what failed.
    pub fn with_error(mut self, error: TokenError) -> Self {
        self.error = Some(error);
        self
    }

    /// Apply a refresh grant: new access token, rotated refresh token when one
    /// was supplied, recomputed expiry, error cleared.
    pub fn rotate(mut self, grant: RefreshGrant, now_ms: i64) -> Self {
        self.access_token_expires_at_ms = Some(access_token_expires_at(&grant.access_token, now_ms));
        self.access_token = Some(grant.access_token);
        if let Some(refresh) = grant.refresh_token {
            self.refresh_token = Some(refresh);
        }
        self.error = None;
        self
    }

    pub fn bearer(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Milliseconds until the access token expires, zero once it has.
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        self.access_token_expires_at_ms
            .map(|at| (at - now_ms).max(0))
            .unwrap_or(0)
    }
}

/// Read the `exp` claim (epoch seconds) from a JWT without verifying it.
///
/// Returns `None` for anything that is not a dot-separated token whose middle
/// segment is base64 JSON carrying a positive numeric `exp`.
pub fn decode_expiry_claim(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    if payload.is_empty() {
        return None;
    }

    // Tolerate padding and the standard alphabet
    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD.decode(normalized).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_f64()?;

    if exp.is_finite() && exp > 0.0 {
        Some(exp as i64)
    } else {
        None
    }
}

/// Absolute expiry in epoch milliseconds: the token's claim, or
/// `now + 15 minutes` when the claim is unreadable.
pub fn access_token_expires_at(token: &str, now_ms: i64) -> i64 {
    match decode_expiry_claim(token) {
        Some(exp) => exp.saturating_mul(1000),
        None => now_ms + DEFAULT_ACCESS_TOKEN_LIFETIME_MS,
    }
}
