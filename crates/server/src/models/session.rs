//! Session-related types for operator authentication.

use serde::{Deserialize, Serialize};

/// Session-stored operator identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentOperator {
    /// Identity-provider user id; matches `domain.owner_user_id`.
    pub user_id: String,
}

/// Session keys for operator authentication data.
pub mod keys {
    pub const CURRENT_OPERATOR: &str = "current_operator";
}
