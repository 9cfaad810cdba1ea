//! Chat room and message models.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use udyog_core::{ChatMessageId, ChatRole, ChatRoomId, CustomerId, DomainId, Email};

/// Upload identifiers are UUIDs embedded in the message text.
static UPLOAD_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("Invalid regex")
});

/// A customer's conversation with the bot or a human operator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoom {
    pub id: ChatRoomId,
    pub customer_id: CustomerId,
    /// A human operator has taken over; the AI stays silent.
    pub live: bool,
    /// The owner has been notified of the handoff.
    pub mailed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One stored message. Messages are never edited.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: ChatMessageId,
    pub chat_room_id: ChatRoomId,
    pub role: ChatRole,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Upload identifier embedded in the message, if the visitor sent an image.
    #[must_use]
    pub fn image_id(&self) -> Option<&str> {
        UPLOAD_ID_RE.find(&self.message).map(|m| m.as_str())
    }
}

/// Dashboard listing entry for a chat room.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: ChatRoomId,
    pub customer_email: Email,
    pub live: bool,
    pub mailed: bool,
    pub updated_at: DateTime<Utc>,
}

/// Ownership of a chat room, used for operator authorization.
#[derive(Debug, Clone)]
pub struct RoomOwner {
    pub room_id: ChatRoomId,
    pub domain_id: DomainId,
    pub domain_name: String,
    pub owner_user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> ChatMessage {
        ChatMessage {
            id: ChatMessageId::new(uuid::Uuid::nil()),
            chat_room_id: ChatRoomId::new(uuid::Uuid::nil()),
            role: ChatRole::User,
            message: text.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_image_id_detected() {
        let msg = message("ucarecdn upload 3f2b8c1e-9a4d-4e6f-8b2a-1c5d7e9f0a3b");
        assert_eq!(msg.image_id(), Some("3f2b8c1e-9a4d-4e6f-8b2a-1c5d7e9f0a3b"));
    }

    #[test]
    fn test_plain_text_has_no_image() {
        assert_eq!(message("just text").image_id(), None);
    }

    #[test]
    fn test_message_serializes_camel_case() {
        let json = serde_json::to_value(message("hi")).expect("serialize");
        assert_eq!(json["role"], "user");
        assert!(json.get("chatRoomId").is_some());
    }
}
