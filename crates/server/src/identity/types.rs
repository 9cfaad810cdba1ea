//! Clerk Backend API payloads (subset).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ClerkUser {
    pub id: String,
    pub primary_email_address_id: Option<String>,
    #[serde(default)]
    pub email_addresses: Vec<ClerkEmailAddress>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClerkEmailAddress {
    pub id: String,
    pub email_address: String,
}

impl ClerkUser {
    /// The primary address, or the first one listed when none is marked.
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        self.primary_email_address_id
            .as_deref()
            .and_then(|primary| self.email_addresses.iter().find(|e| e.id == primary))
            .or_else(|| self.email_addresses.first())
            .map(|e| e.email_address.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifySessionRequest<'a> {
    pub token: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClerkSession {
    pub id: String,
    pub user_id: String,
    pub status: String,
}

impl ClerkSession {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// Error body returned by Clerk.
#[derive(Debug, Clone, Deserialize)]
pub struct ClerkErrorResponse {
    #[serde(default)]
    pub errors: Vec<ClerkErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClerkErrorDetail {
    pub message: String,
    pub long_message: Option<String>,
    pub code: String,
}
