//! Operator side of chat rooms: reading transcripts, replying as a human and
//! switching rooms between the AI and realtime mode.

use sqlx::PgPool;
use tracing::{info, instrument};

use udyog_core::{ChatRole, ChatRoomId, DomainId};

use crate::db::{ChatRoomRepository, DomainRepository, RepositoryError};
use crate::models::{ChatMessage, RoomOwner, RoomSummary};
use crate::realtime::{RealtimeEvent, RealtimeHub};

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// The room or domain does not exist or belongs to another operator.
    #[error("not found")]
    NotFound,

    #[error("message is empty")]
    EmptyMessage,
}

/// Conversation access for one signed-in operator.
pub struct ConversationService<'a> {
    pool: &'a PgPool,
    realtime: &'a RealtimeHub,
    operator_id: &'a str,
}

impl<'a> ConversationService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, realtime: &'a RealtimeHub, operator_id: &'a str) -> Self {
        Self {
            pool,
            realtime,
            operator_id,
        }
    }

    /// Rooms of a domain the operator owns, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `ConversationError::NotFound` if the operator does not own the
    /// domain.
    #[instrument(skip(self), fields(operator = %self.operator_id))]
    pub async fn list_rooms(&self, domain_id: DomainId) -> Result<Vec<RoomSummary>, ConversationError> {
        let owner = DomainRepository::new(self.pool).owner(domain_id).await?;
        if owner.as_deref() != Some(self.operator_id) {
            return Err(ConversationError::NotFound);
        }
        Ok(ChatRoomRepository::new(self.pool)
            .list_for_domain(domain_id)
            .await?)
    }

    /// Full transcript of a room.
    ///
    /// # Errors
    ///
    /// Returns `ConversationError::NotFound` if the operator does not own the
    /// room.
    pub async fn messages(&self, room_id: ChatRoomId) -> Result<Vec<ChatMessage>, ConversationError> {
        self.owned_room(room_id).await?;
        Ok(ChatRoomRepository::new(self.pool).messages(room_id).await?)
    }

    /// Store a human reply and push it to the visitor's widget.
    ///
    /// # Errors
    ///
    /// Returns `ConversationError::EmptyMessage` for blank text and
    /// `ConversationError::NotFound` if the operator does not own the room.
    #[instrument(skip(self, message), fields(operator = %self.operator_id, chat_room_id = %room_id))]
    pub async fn reply(
        &self,
        room_id: ChatRoomId,
        message: &str,
    ) -> Result<ChatMessage, ConversationError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ConversationError::EmptyMessage);
        }
        self.owned_room(room_id).await?;

        let stored = ChatRoomRepository::new(self.pool)
            .add_message(room_id, ChatRole::Assistant, message)
            .await?;
        let delivered = self
            .realtime
            .publish(room_id, RealtimeEvent::new(ChatRole::Assistant, message));
        info!(delivered, "Operator reply sent");
        Ok(stored)
    }

    /// Take a room over (`live = true`) or hand it back to the AI.
    ///
    /// # Errors
    ///
    /// Returns `ConversationError::NotFound` if the operator does not own the
    /// room.
    #[instrument(skip(self), fields(operator = %self.operator_id))]
    pub async fn set_live(&self, room_id: ChatRoomId, live: bool) -> Result<(), ConversationError> {
        self.owned_room(room_id).await?;
        ChatRoomRepository::new(self.pool)
            .set_live(room_id, live)
            .await?;
        info!(chat_room_id = %room_id, live, "Room mode changed");
        Ok(())
    }

    async fn owned_room(&self, room_id: ChatRoomId) -> Result<RoomOwner, ConversationError> {
        ChatRoomRepository::new(self.pool)
            .owner(room_id)
            .await?
            .filter(|owner| owns(owner, self.operator_id))
            .ok_or(ConversationError::NotFound)
    }
}

fn owns(owner: &RoomOwner, operator_id: &str) -> bool {
    owner.owner_user_id == operator_id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(user: &str) -> RoomOwner {
        RoomOwner {
            room_id: ChatRoomId::new(uuid::Uuid::new_v4()),
            domain_id: DomainId::new(uuid::Uuid::new_v4()),
            domain_name: "Acme".to_string(),
            owner_user_id: user.to_string(),
        }
    }

    #[test]
    fn test_owner_matches_exactly() {
        assert!(owns(&owner("user_1"), "user_1"));
        assert!(!owns(&owner("user_1"), "user_2"));
        assert!(!owns(&owner("user_1"), "USER_1"));
    }

    #[test]
    fn test_not_found_hides_ownership() {
        assert_eq!(ConversationError::NotFound.to_string(), "not found");
    }
}
