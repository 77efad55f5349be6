//! The session context handed to everything that makes authenticated calls.
//!
//! It holds the one live [`SessionToken`] in a `watch` channel so front ends
//! can react to sign-in, refresh and forced sign-out, and it is the only path
//! to a bearer token: [`SessionContext::authorize`] runs the token through
//! the [`SessionManager`] first.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::manager::SessionManager;
use super::store::SessionStore;
use super::token::{Principal, SessionToken};
use crate::api::ApiError;

/// Clone is cheap; clones share the manager, the token and the store.
#[derive(Clone)]
pub struct SessionContext {
    manager: Arc<SessionManager>,
    state: Arc<watch::Sender<Option<SessionToken>>>,
    store: Option<Arc<SessionStore>>,
}

impl SessionContext {
    pub fn new(manager: SessionManager) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            manager: Arc::new(manager),
            state: Arc::new(state),
            store: None,
        }
    }

    /// Persist every change to `store`.
    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Load the persisted session, if any. Returns whether one was found.
    pub fn restore(&self) -> Result<bool> {
        let Some(ref store) = self.store else {
            return Ok(false);
        };
        match store.load()? {
            Some(token) => {
                self.state.send_replace(Some(token));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn current(&self) -> Option<SessionToken> {
        self.state.borrow().clone()
    }

    pub fn principal(&self) -> Option<Principal> {
        self.state.borrow().as_ref().map(|t| t.principal.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Watch sign-in, refresh and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionToken>> {
        self.state.subscribe()
    }

    pub fn sign_in(&self, token: SessionToken) {
        info!(user = %token.principal.email, "Signed in");
        self.state.send_replace(Some(token.clone()));
        self.persist(&token);
    }

    pub fn sign_out(&self) {
        let previous = self.state.send_replace(None);
        self.clear_store();
        if let Some(token) = previous {
            info!(user = %token.principal.email, "Signed out");
        }
    }

    /// Bearer token for the next request, refreshed when needed.
    ///
    /// A terminal session is torn down here and reported as
    /// [`ApiError::SessionExpired`] so the request is never dispatched.
    pub async fn authorize(&self) -> Result<Option<String>, ApiError> {
        let token = self.current().ok_or(ApiError::NotSignedIn)?;
        self.authorize_token(token).await
    }

    async fn authorize_token(&self, snapshot: SessionToken) -> Result<Option<String>, ApiError> {
        let mut fresh = self.manager.ensure_fresh(snapshot).await;

        // Another task may have rotated the refresh token after our snapshot
        // was taken; the rejection then only concerns the stale copy.
        if fresh.error.is_some() {
            if let Some(live) = self.current() {
                if live.refresh_token != fresh.refresh_token && live.principal == fresh.principal {
                    debug!("Session rotated during refresh, retrying with the live token");
                    fresh = self.manager.ensure_fresh(live).await;
                }
            }
        }

        if let Some(kind) = fresh.error {
            warn!(error = %kind, "Session can no longer be refreshed, signing out");
            self.expire(&fresh);
            return Err(ApiError::SessionExpired(kind));
        }

        let bearer = fresh.access_token.clone();
        self.update(fresh);
        Ok(bearer)
    }

    /// Sign out, but only if the live session is still the one that failed.
    fn expire(&self, failed: &SessionToken) {
        let expired = self.state.send_if_modified(|current| {
            let same = current.as_ref().is_some_and(|existing| {
                existing.principal == failed.principal && existing.refresh_token == failed.refresh_token
            });
            if same {
                *current = None;
            }
            same
        });
        if expired {
            self.clear_store();
            info!(user = %failed.principal.email, "Signed out");
        }
    }

    /// Replace the live token with a newer copy of the same session. Ignored
    /// when the user signed out or someone else signed in meanwhile.
    fn update(&self, fresh: SessionToken) {
        let changed = self.state.send_if_modified(|current| match current {
            Some(existing) if existing.principal == fresh.principal && *existing != fresh => {
                *existing = fresh.clone();
                true
            }
            _ => false,
        });
        if changed {
            self.persist(&fresh);
        }
    }

    fn clear_store(&self) {
        if let Some(ref store) = self.store {
            if let Err(e) = store.clear() {
                warn!(error = %e, "Failed to remove stored session");
            }
        }
    }

    fn persist(&self, token: &SessionToken) {
        if let Some(ref store) = self.store {
            if let Err(e) = store.save(token) {
                warn!(error = %e, "Failed to save session");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::token::TokenError;
    use crate::testutil::{session_context as context_for, session_token as token};

    #[tokio::test]
    async fn test_authorize_without_session() {
        let server = MockServer::start().await;
        let context = context_for(&server);
        assert!(matches!(context.authorize().await, Err(ApiError::NotSignedIn)));
    }

    #[tokio::test]
    async fn test_authorize_fresh_token() {
        let server = MockServer::start().await;
        let context = context_for(&server);
        context.sign_in(token(10 * 60 * 1000, Some("R1")));

        assert_eq!(context.authorize().await.expect("authorized"), Some("A1".to_string()));
    }

    #[tokio::test]
    async fn test_authorize_publishes_refreshed_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "accessToken": "A2", "refreshToken": "R2" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let context = context_for(&server);
        let mut updates = context.subscribe();
        context.sign_in(token(-1000, Some("R1")));
        updates.borrow_and_update();

        assert_eq!(context.authorize().await.expect("authorized"), Some("A2".to_string()));
        assert!(updates.has_changed().expect("sender alive"));
        let current = context.current().expect("still signed in");
        assert_eq!(current.refresh_token.as_deref(), Some("R2"));
    }

    #[tokio::test]
    async fn test_terminal_refresh_signs_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let context = context_for(&server);
        context.sign_in(token(-1000, Some("R1")));

        let err = context.authorize().await.expect_err("refresh rejected");
        assert!(matches!(err, ApiError::SessionExpired(TokenError::RefreshAccessTokenError)));
        assert!(err.requires_login());
        assert!(!context.is_signed_in());
    }

    #[tokio::test]
    async fn test_stale_snapshot_after_rotation_keeps_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({ "refreshToken": "R1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "accessToken": "A2", "refreshToken": "R2" }
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        // R1 is single use
        Mock::given(method("POST"))
            .and(body_json(json!({ "refreshToken": "R1" })))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let context = context_for(&server);
        let snapshot = token(-1000, Some("R1"));
        context.sign_in(snapshot.clone());
        assert_eq!(context.authorize().await.expect("authorized"), Some("A2".to_string()));

        let bearer = context.authorize_token(snapshot).await.expect("live session used");
        assert_eq!(bearer, Some("A2".to_string()));
        let current = context.current().expect("still signed in");
        assert_eq!(current.refresh_token.as_deref(), Some("R2"));
    }

    #[tokio::test]
    async fn test_failed_refresh_of_replaced_session_leaves_it_alone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let context = context_for(&server);
        let mut other = token(10 * 60 * 1000, Some("R7"));
        other.principal.id = "u2".to_string();
        other.principal.email = "other@example.com".to_string();
        context.sign_in(other.clone());

        let err = context
            .authorize_token(token(-1000, Some("R1")))
            .await
            .expect_err("stale session rejected");
        assert!(matches!(err, ApiError::SessionExpired(TokenError::RefreshAccessTokenError)));
        assert_eq!(context.current(), Some(other));
    }

    #[tokio::test]
    async fn test_missing_refresh_token_signs_out() {
        let server = MockServer::start().await;
        let context = context_for(&server);
        context.sign_in(token(-1000, None));

        let err = context.authorize().await.expect_err("cannot refresh");
        assert!(matches!(err, ApiError::SessionExpired(TokenError::MissingRefreshToken)));
        assert!(context.current().is_none());
    }

    #[tokio::test]
    async fn test_session_persisted_and_cleared() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().expect("temp dir");
        let store = SessionStore::new(dir.path().to_path_buf(), "test-secret");
        let context = context_for(&server).with_store(store.clone());

        context.sign_in(token(10 * 60 * 1000, Some("R1")));
        assert_eq!(store.load().expect("load"), context.current());

        let restored = context_for(&server).with_store(store.clone());
        assert!(restored.restore().expect("restore"));
        assert_eq!(restored.principal().map(|p| p.email), Some("admin@example.com".to_string()));

        context.sign_out();
        assert_eq!(store.load().expect("load"), None);
    }
}
