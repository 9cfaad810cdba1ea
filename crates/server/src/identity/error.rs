//! Identity provider errors.

use thiserror::Error;

/// Errors that can occur when talking to Clerk.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Clerk request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Clerk answered with a non-success status.
    #[error("Clerk API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Clerk resource not found: {0}")]
    NotFound(String),

    /// The user exists but has no usable email address.
    #[error("user {0} has no email address")]
    NoEmail(String),

    /// The session is not active or belongs to nobody.
    #[error("session {0} is not active")]
    InactiveSession(String),

    #[error("Clerk response error: {0}")]
    Parse(String),

    #[error("Clerk configuration error: {0}")]
    Config(String),
}
