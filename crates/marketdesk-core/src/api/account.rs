//! The signed-in admin's own account.

use anyhow::{Context, Result};
use serde_json::json;

use super::AdminClient;
use crate::models::{ApiMessage, Profile, ProfileUpdate};
use crate::utils::validate_new_password;

impl AdminClient {
    pub async fn profile(&self) -> Result<Profile> {
        self.get("/user/profile", &[])
            .await
            .context("Failed to fetch profile")
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile> {
        self.put("/user/profile", update)
            .await
            .context("Failed to update profile")
    }

    /// Change the password. `confirm` must repeat `new_password`; both are
    /// checked before anything is sent.
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<ApiMessage> {
        validate_new_password(new_password, confirm)?;
        self.post(
            "/auth/change-password",
            &json!({ "oldPassword": old_password, "newPassword": new_password }),
        )
        .await
        .context("Failed to change password")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::ApiError;
    use crate::models::ProfileUpdate;
    use crate::testutil::signed_in_client;

    #[tokio::test]
    async fn test_profile_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "_id": "u1", "name": "Jane Admin", "email": "admin@example.com" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/user/profile"))
            .and(body_json(json!({ "phone": "555-0100" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "_id": "u1", "name": "Jane Admin", "phone": "555-0100" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = signed_in_client(&server);
        let profile = client.profile().await.expect("profile");
        assert_eq!(profile.initials(), "JA");

        let update = ProfileUpdate {
            phone: Some("555-0100".to_string()),
            ..ProfileUpdate::default()
        };
        let updated = client.update_profile(&update).await.expect("update");
        assert_eq!(updated.phone.as_deref(), Some("555-0100"));
    }

    #[tokio::test]
    async fn test_change_password() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/change-password"))
            .and(body_json(json!({ "oldPassword": "old-secret", "newPassword": "new-secret" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Password changed"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = signed_in_client(&server);
        let message = client
            .change_password("old-secret", "new-secret", "new-secret")
            .await
            .expect("changed");
        assert_eq!(message.message, "Password changed");

        // Mismatched confirmation never leaves the client
        let err = client
            .change_password("old-secret", "new-secret", "new-secrte")
            .await
            .expect_err("mismatch");
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Validation(_))));
    }
}
