//! Unauthenticated endpoints: credential login, token refresh and the
//! forgot/reset password flow.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::client::check_response;
use super::ApiError;
use crate::auth::{now_ms, Principal, RefreshGrant, SessionToken};
use crate::models::ApiMessage;
use crate::utils::{validate_login, validate_otp};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
    #[serde(rename = "refreshToken")]
    refresh_token: Option<String>,
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: String,
}

#[derive(Debug, Deserialize)]
struct RefreshData {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
    #[serde(rename = "refreshToken")]
    refresh_token: Option<String>,
}

/// Clone is cheap - the underlying reqwest::Client is shared.
#[derive(Clone)]
pub struct AuthApi {
    client: Client,
    base_url: String,
}

impl AuthApi {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Verify credentials and build the session record.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionToken> {
        validate_login(email, password)?;

        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email.trim(), "password": password }))
            .send()
            .await
            .context("Failed to send login request")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            return Err(ApiError::from_status(status, &body).into());
        }
        if !status.is_success() {
            return Err(ApiError::InvalidCredentials(ApiError::server_message(&body)).into());
        }

        let data = serde_json::from_str::<Envelope<LoginData>>(&body)
            .ok()
            .and_then(|e| e.data)
            .ok_or_else(|| ApiError::InvalidCredentials("Invalid credentials".to_string()))?;
        let access_token = data
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::InvalidCredentials("Invalid credentials".to_string()))?;

        debug!(user = %data.email, "Credentials accepted");

        Ok(SessionToken::issue(
            access_token,
            data.refresh_token.filter(|t| !t.is_empty()),
            Principal {
                id: data.id,
                email: data.email,
                name: data.name,
                role: data.role,
            },
            now_ms(),
        ))
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Any non-2xx answer, transport error, or body without an access token
    /// is an error.
    pub async fn refresh_grant(&self, refresh_token: &str) -> Result<RefreshGrant> {
        let response = self
            .client
            .post(self.url("/auth/refresh-token"))
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .context("Failed to send refresh request")?;

        let response = check_response(response).await?;
        let envelope: Envelope<RefreshData> = response
            .json()
            .await
            .context("Failed to parse refresh response")?;

        let data = envelope
            .data
            .ok_or_else(|| ApiError::InvalidResponse("refresh response has no data".to_string()))?;
        let access_token = data.access_token.filter(|t| !t.is_empty()).ok_or_else(|| {
            ApiError::InvalidResponse("refresh response has no access token".to_string())
        })?;

        Ok(RefreshGrant {
            access_token,
            refresh_token: data.refresh_token.filter(|t| !t.is_empty()),
        })
    }

    /// Mail a one-time code to `email`.
    pub async fn forgot_password(&self, email: &str) -> Result<ApiMessage> {
        self.post_message("/auth/forget", &json!({ "email": email.trim() })).await
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<ApiMessage> {
        validate_otp(otp)?;
        self.post_message("/auth/verify", &json!({ "email": email.trim(), "otp": otp }))
            .await
    }

    /// Set a new password with a verified one-time code.
    pub async fn reset_password(&self, email: &str, otp: &str, password: &str) -> Result<ApiMessage> {
        validate_otp(otp)?;
        self.post_message(
            "/auth/reset-password",
            &json!({ "email": email.trim(), "otp": otp, "password": password }),
        )
        .await
    }

    async fn post_message<B: Serialize>(&self, path: &str, body: &B) -> Result<ApiMessage> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send POST request to {}", url))?;

        let response = check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_login_builds_session_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({ "email": "admin@example.com", "password": "hunter22" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Logged in",
                "data": {
                    "accessToken": "A1",
                    "refreshToken": "R1",
                    "name": "Admin",
                    "email": "admin@example.com",
                    "role": "admin",
                    "_id": "u1"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = AuthApi::new(reqwest::Client::new(), format!("{}/", server.uri()));
        let token = api.login(" admin@example.com ", "hunter22").await.expect("login");

        assert_eq!(token.access_token.as_deref(), Some("A1"));
        assert_eq!(token.refresh_token.as_deref(), Some("R1"));
        assert_eq!(token.principal.id, "u1");
        assert_eq!(token.principal.role, "admin");
        assert!(token.is_fresh_at(now_ms()));
        assert!(!token.is_terminal());
    }

    #[tokio::test]
    async fn test_login_rejected_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "success": false,
                "message": "Wrong password"
            })))
            .mount(&server)
            .await;

        let api = AuthApi::new(reqwest::Client::new(), server.uri());
        let err = api.login("admin@example.com", "nope").await.expect_err("rejected");
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::InvalidCredentials(m)) if m == "Wrong password"
        ));
    }

    #[tokio::test]
    async fn test_login_without_access_token_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "_id": "u1" } })))
            .mount(&server)
            .await;

        let api = AuthApi::new(reqwest::Client::new(), server.uri());
        let err = api.login("admin@example.com", "pw").await.expect_err("no token");
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn test_login_validates_before_sending() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let api = AuthApi::new(reqwest::Client::new(), server.uri());
        let err = api.login("", "pw").await.expect_err("empty email");
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/forget"))
            .and(body_json(json!({ "email": "admin@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "message": "OTP sent" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/verify"))
            .and(body_json(json!({ "email": "admin@example.com", "otp": "123456" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "message": "Verified" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/reset-password"))
            .and(body_json(json!({ "email": "admin@example.com", "otp": "123456", "password": "newpass" })))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "success": false, "message": "OTP expired" })))
            .expect(1)
            .mount(&server)
            .await;

        let api = AuthApi::new(reqwest::Client::new(), server.uri());
        assert_eq!(api.forgot_password("admin@example.com").await.expect("forgot").message, "OTP sent");
        assert!(api.verify_otp("admin@example.com", "123456").await.expect("verify").success);

        let err = api
            .reset_password("admin@example.com", "123456", "newpass")
            .await
            .expect_err("expired otp");
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::BadRequest(m)) if m == "OTP expired"));

        // Malformed codes never leave the client
        assert!(api.verify_otp("admin@example.com", "12").await.is_err());
    }
}
