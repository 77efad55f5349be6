//! Access-token lifecycle: keeps a [`SessionToken`] fresh and coalesces
//! overlapping refreshes into a single request.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use super::now_ms;
use super::token::{SessionToken, TokenError};
use crate::api::AuthApi;

type PendingRefresh = Shared<BoxFuture<'static, SessionToken>>;
type RefreshSlot = Arc<Mutex<Option<PendingRefresh>>>;

pub struct SessionManager {
    auth: AuthApi,
    /// At most one refresh is outstanding; late callers await this one.
    in_flight: RefreshSlot,
}

impl SessionManager {
    pub fn new(auth: AuthApi) -> Self {
        Self {
            auth,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Return `token` if it is still good for at least another minute,
    /// otherwise a refreshed copy. Failures come back as a terminal token,
    /// never as an error.
    ///
    /// The token must carry an access or a refresh token; with neither it
    /// ends up terminal with [`TokenError::MissingRefreshToken`].
    pub async fn ensure_fresh(&self, token: SessionToken) -> SessionToken {
        if token.is_terminal() {
            return token;
        }

        let now = now_ms();
        let token = token.with_derived_expiry(now);
        if token.is_fresh_at(now) {
            return token;
        }

        debug!(
            expires_at_ms = ?token.access_token_expires_at_ms,
            "Access token stale, refreshing"
        );
        self.refresh(token).await
    }

    /// Whether a refresh request is currently outstanding.
    pub fn is_refreshing(&self) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    async fn refresh(&self, token: SessionToken) -> SessionToken {
        if token.refresh_token.is_none() {
            warn!("No refresh token available, session cannot be renewed");
            return token.with_error(TokenError::MissingRefreshToken);
        }

        let pending = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(pending) => {
                    debug!("Joining in-flight token refresh");
                    pending.clone()
                }
                None => {
                    // Runs on its own task so the slot is released even if
                    // every waiter is dropped.
                    let handle = tokio::spawn(run_refresh(
                        self.auth.clone(),
                        Arc::clone(&self.in_flight),
                        token.clone(),
                    ));
                    let pending = async move {
                        match handle.await {
                            Ok(token) => token,
                            Err(e) => {
                                warn!(error = %e, "Token refresh task failed");
                                token.with_error(TokenError::RefreshAccessTokenError)
                            }
                        }
                    }
                    .boxed()
                    .shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }
}

/// Empties the in-flight slot when the refresh future finishes, whatever the
/// outcome.
struct SlotRelease(RefreshSlot);

impl Drop for SlotRelease {
    fn drop(&mut self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

async fn run_refresh(auth: AuthApi, slot: RefreshSlot, token: SessionToken) -> SessionToken {
    let _release = SlotRelease(slot);

    let Some(refresh_token) = token.refresh_token.clone() else {
        return token.with_error(TokenError::MissingRefreshToken);
    };

    match auth.refresh_grant(&refresh_token).await {
        Ok(grant) => {
            let rotated = grant.refresh_token.is_some();
            let token = token.rotate(grant, now_ms());
            info!(refresh_token_rotated = rotated, "Access token refreshed");
            token
        }
        Err(e) => {
            warn!(error = %e, "Access token refresh failed");
            token.with_error(TokenError::RefreshAccessTokenError)
        }
    }
}
