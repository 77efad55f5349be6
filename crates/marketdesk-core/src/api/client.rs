//! Authenticated client for the marketplace admin REST API.
//!
//! Every request asks the [`SessionContext`] for a bearer token first, so an
//! expiring access token is refreshed before dispatch and a dead session
//! stops the request before it leaves. Endpoint wrappers live in the sibling
//! modules as further `impl AdminClient` blocks.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, multipart, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{ApiError, AuthApi};
use crate::auth::{SessionContext, SessionToken};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Build the shared HTTP client used by both the auth endpoints and the admin
/// client.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .context("Failed to build HTTP client")
}

/// Check if response is successful, returning an error with body if not.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body).into())
    }
}

/// Unwrap the `{ success, message, data }` envelope: `data` when present,
/// otherwise the whole body.
pub(crate) fn unwrap_data<T: DeserializeOwned>(body: Value) -> Result<T> {
    let payload = match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) if !data.is_null() => data,
            _ => Value::Object(map),
        },
        other => other,
    };
    serde_json::from_value(payload).context("Unexpected response payload")
}

/// Clone is cheap - reqwest::Client and the session context are shared.
#[derive(Clone)]
pub struct AdminClient {
    client: Client,
    base_url: String,
    session: SessionContext,
}

impl AdminClient {
    pub fn new(client: Client, base_url: impl Into<String>, session: SessionContext) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// The unauthenticated endpoints, sharing this client's connection pool.
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.client.clone(), self.base_url.clone())
    }

    /// Verify credentials and make the result the live session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionToken> {
        let token = self.auth().login(email, password).await?;
        self.session.sign_in(token.clone());
        Ok(token)
    }

    pub fn sign_out(&self) {
        self.session.sign_out();
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.session.authorize().await? {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit
    /// (should retry), or Err for other errors. A 401 tears the session down.
    async fn check_response_for_retry(
        &self,
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>> {
        let status = response.status();
        if status.is_success() {
            Ok(Some(response))
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else if status == StatusCode::UNAUTHORIZED {
            warn!(url = %response.url(), "Request rejected as unauthorized, signing out");
            self.session.sign_out();
            Err(ApiError::Unauthorized.into())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Send a JSON request and return the raw response body.
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .headers(self.auth_headers().await?);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("Failed to send {} request to {}", method, url))?;

            match self.check_response_for_retry(response).await? {
                Some(response) => {
                    debug!(method = %method, url = %url, "Request succeeded");
                    return read_json(response)
                        .await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        unwrap_data(self.send(Method::GET, path, query, None).await?)
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        unwrap_data(self.send(Method::POST, path, &[], Some(&body)).await?)
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        unwrap_data(self.send(Method::PUT, path, &[], Some(&body)).await?)
    }

    pub(crate) async fn patch<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        unwrap_data(self.send(Method::PATCH, path, &[], Some(&body)).await?)
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<Value> {
        self.send(Method::DELETE, path, &[], None).await
    }

    /// Multipart upload. Not retried on 429: the form is consumed by the
    /// first attempt.
    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: multipart::Form,
    ) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers().await?)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Failed to send upload to {}", url))?;

        match self.check_response_for_retry(response).await? {
            Some(response) => unwrap_data(read_json(response).await?),
            None => Err(ApiError::RateLimited.into()),
        }
    }
}

/// Parse a JSON body, treating an empty body as `null`.
async fn read_json(response: reqwest::Response) -> Result<Value> {
    let text = response.text().await.context("Failed to read response body")?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| ApiError::InvalidResponse(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_unwrap_data() {
        let list: Vec<i32> = unwrap_data(json!({ "success": true, "data": [1, 2] })).expect("data");
        assert_eq!(list, vec![1, 2]);

        let bare: Vec<i32> = unwrap_data(json!([3])).expect("bare array");
        assert_eq!(bare, vec![3]);

        // No data key: the body itself
        let body: Value = unwrap_data(json!({ "success": true, "message": "ok" })).expect("body");
        assert_eq!(body["message"], "ok");

        // Null data falls back to the body as well
        let body: Value = unwrap_data(json!({ "data": null, "message": "gone" })).expect("body");
        assert_eq!(body["message"], "gone");
    }
}
