// services/identity_service.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::config::AppConfig;

#[derive(Error, Debug)]
#[error("identity provider error: {0}")]
pub struct IdentityError(pub String);

#[derive(Debug, Clone)]
pub struct IdentityUser {
    pub uid: String,
    pub email: String,
}

/// The two capabilities the OTP flows need from the account backend:
/// look an identity up by email, and replace its password.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn find_user_by_email(&self, email: &str)
        -> Result<Option<IdentityUser>, IdentityError>;

    async fn update_password(&self, uid: &str, new_password: &str)
        -> Result<(), IdentityError>;
}

#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    email: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
struct LookupUser {
    #[serde(rename = "localId")]
    local_id: String,
    #[serde(default)]
    email: String,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    #[serde(rename = "localId")]
    local_id: &'a str,
    password: &'a str,
    #[serde(rename = "returnSecureToken")]
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Firebase Auth over its Identity Toolkit REST surface.
#[derive(Clone)]
pub struct FirebaseAuthClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl FirebaseAuthClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        FirebaseAuthClient {
            base_url: config.identity_base_url.trim_end_matches('/').to_string(),
            api_key: config.identity_api_key.clone(),
            client,
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/accounts:{}?key={}", self.base_url, action, self.api_key)
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ApiErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => format!("unexpected status {}", status),
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<IdentityUser>, IdentityError> {
        let response = self
            .client
            .post(self.endpoint("lookup"))
            .json(&LookupRequest { email: vec![email] })
            .send()
            .await
            .map_err(|e| IdentityError(format!("lookup request failed: {}", e)))?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            // The toolkit reports a missing account as an error code rather
            // than an empty result set.
            if message.contains("USER_NOT_FOUND") || message.contains("EMAIL_NOT_FOUND") {
                return Ok(None);
            }
            error!("Identity lookup failed for {}: {}", email, message);
            return Err(IdentityError(message));
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| IdentityError(format!("lookup response malformed: {}", e)))?;

        Ok(body.users.into_iter().next().map(|u| IdentityUser {
            uid: u.local_id,
            email: if u.email.is_empty() {
                email.to_string()
            } else {
                u.email
            },
        }))
    }

    async fn update_password(&self, uid: &str, new_password: &str) -> Result<(), IdentityError> {
        let response = self
            .client
            .post(self.endpoint("update"))
            .json(&UpdateRequest {
                local_id: uid,
                password: new_password,
                return_secure_token: false,
            })
            .send()
            .await
            .map_err(|e| IdentityError(format!("update request failed: {}", e)))?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            error!("Password update failed for uid {}: {}", uid, message);
            return Err(IdentityError(message));
        }

        Ok(())
    }
}
