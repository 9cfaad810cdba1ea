//! Customer (site visitor who left an email) types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use udyog_core::{CustomerId, CustomerResponseId, DomainId, Email};

use super::chat::ChatRoom;

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    pub domain_id: DomainId,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}

/// A filter question copied onto a customer, answered at most once.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerResponse {
    pub id: CustomerResponseId,
    pub customer_id: CustomerId,
    pub question: String,
    pub answered: Option<String>,
}

/// A customer together with their single chat room.
#[derive(Debug, Clone)]
pub struct CustomerThread {
    pub customer: Customer,
    pub room: ChatRoom,
}
