//! Clerk Backend API client.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use udyog_core::Email;

use crate::config::ClerkConfig;

use super::error::IdentityError;
use super::types::{ClerkErrorResponse, ClerkSession, ClerkUser, VerifySessionRequest};

/// Clerk Backend API client.
#[derive(Clone)]
pub struct ClerkClient {
    client: Client,
    secret_key: SecretString,
    api_url: String,
}

impl std::fmt::Debug for ClerkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClerkClient")
            .field("secret_key", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl ClerkClient {
    #[must_use]
    pub fn new(config: &ClerkConfig) -> Self {
        Self {
            client: Client::new(),
            secret_key: config.secret_key.clone(),
            api_url: config.api_url.clone(),
        }
    }

    /// Fetch a user record.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::NotFound` for unknown users, or another
    /// variant if the request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_user(&self, user_id: &str) -> Result<ClerkUser, IdentityError> {
        let response = self
            .client
            .get(format!("{}/users/{user_id}", self.api_url))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        let response = Self::check_status(response, user_id).await?;
        response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))
    }

    /// Primary email address of a user.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::NoEmail` if the user has no parseable address,
    /// or the error from [`ClerkClient::get_user`].
    pub async fn primary_email(&self, user_id: &str) -> Result<Email, IdentityError> {
        let user = self.get_user(user_id).await?;
        let address = user
            .primary_email()
            .ok_or_else(|| IdentityError::NoEmail(user.id.clone()))?;
        Email::parse(address).map_err(|_| IdentityError::NoEmail(user.id.clone()))
    }

    /// Verify a session token and return the signed-in user id.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InactiveSession` if Clerk reports the session as
    /// anything but active, or another variant if the request fails.
    #[instrument(skip(self, token), fields(session_id = %session_id))]
    pub async fn verify_session(
        &self,
        session_id: &str,
        token: &str,
    ) -> Result<String, IdentityError> {
        let response = self
            .client
            .post(format!("{}/sessions/{session_id}/verify", self.api_url))
            .bearer_auth(self.secret_key.expose_secret())
            .json(&VerifySessionRequest { token })
            .send()
            .await?;

        let response = Self::check_status(response, session_id).await?;
        let session: ClerkSession = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;

        if !session.is_active() {
            return Err(IdentityError::InactiveSession(session.id));
        }

        debug!(user_id = %session.user_id, "Clerk session verified");
        Ok(session.user_id)
    }

    async fn check_status(
        response: reqwest::Response,
        resource: &str,
    ) -> Result<reqwest::Response, IdentityError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(IdentityError::NotFound(resource.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ClerkErrorResponse>(&body)
            .ok()
            .and_then(|parsed| parsed.errors.into_iter().next())
            .map_or(body, |detail| detail.long_message.unwrap_or(detail.message));

        Err(IdentityError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
