//! Shared test helpers for the `#[cfg(test)]` modules.

use reqwest::Client;
use wiremock::MockServer;

use crate::api::{AdminClient, AuthApi};
use crate::auth::{now_ms, Principal, SessionContext, SessionManager, SessionToken};

pub fn principal() -> Principal {
    Principal {
        id: "u1".to_string(),
        email: "admin@example.com".to_string(),
        name: "Admin".to_string(),
        role: "admin".to_string(),
    }
}

/// A session whose access token `A1` expires `expires_in_ms` from now.
pub fn session_token(expires_in_ms: i64, refresh_token: Option<&str>) -> SessionToken {
    SessionToken {
        access_token: Some("A1".to_string()),
        refresh_token: refresh_token.map(str::to_string),
        access_token_expires_at_ms: Some(now_ms() + expires_in_ms),
        principal: principal(),
        error: None,
    }
}

pub fn session_context(server: &MockServer) -> SessionContext {
    SessionContext::new(SessionManager::new(AuthApi::new(Client::new(), server.uri())))
}

/// Admin client against `server`, signed in with a token good for ten minutes.
pub fn signed_in_client(server: &MockServer) -> AdminClient {
    let session = session_context(server);
    session.sign_in(session_token(10 * 60 * 1000, Some("R1")));
    AdminClient::new(Client::new(), server.uri(), session)
}
