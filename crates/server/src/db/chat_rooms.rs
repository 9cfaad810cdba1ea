//! Database operations for chat rooms and messages.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use udyog_core::{ChatMessageId, ChatRole, ChatRoomId, DomainId, Email};

use super::RepositoryError;
use super::customers::ChatRoomRow;
use crate::models::{ChatMessage, ChatRoom, RoomOwner, RoomSummary};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ChatMessageRow {
    id: ChatMessageId,
    chat_room_id: ChatRoomId,
    role: ChatRole,
    message: String,
    created_at: DateTime<Utc>,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        Self {
            id: row.id,
            chat_room_id: row.chat_room_id,
            role: row.role,
            message: row.message,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RoomSummaryRow {
    id: ChatRoomId,
    customer_email: Email,
    live: bool,
    mailed: bool,
    updated_at: DateTime<Utc>,
}

impl From<RoomSummaryRow> for RoomSummary {
    fn from(row: RoomSummaryRow) -> Self {
        Self {
            id: row.id,
            customer_email: row.customer_email,
            live: row.live,
            mailed: row.mailed,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RoomOwnerRow {
    room_id: ChatRoomId,
    domain_id: DomainId,
    domain_name: String,
    owner_user_id: String,
}

impl From<RoomOwnerRow> for RoomOwner {
    fn from(row: RoomOwnerRow) -> Self {
        Self {
            room_id: row.room_id,
            domain_id: row.domain_id,
            domain_name: row.domain_name,
            owner_user_id: row.owner_user_id,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for chat room state and transcripts.
pub struct ChatRoomRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ChatRoomRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a chat room by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ChatRoomId) -> Result<Option<ChatRoom>, RepositoryError> {
        let row = sqlx::query_as::<_, ChatRoomRow>(
            r"
            SELECT id, customer_id, live, mailed, created_at, updated_at
            FROM chatbot.chat_room
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Append a message to a room and bump the room's `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the room does not exist.
    #[instrument(skip(self, message), fields(chat_room_id = %room_id, role = %role))]
    pub async fn add_message(
        &self,
        room_id: ChatRoomId,
        role: ChatRole,
        message: &str,
    ) -> Result<ChatMessage, RepositoryError> {
        let row = sqlx::query_as::<_, ChatMessageRow>(
            r"
            WITH room AS (
                UPDATE chatbot.chat_room
                SET updated_at = now()
                WHERE id = $1
                RETURNING id
            )
            INSERT INTO chatbot.chat_message (chat_room_id, role, message)
            SELECT room.id, $2, $3 FROM room
            RETURNING id, chat_room_id, role, message, created_at
            ",
        )
        .bind(room_id)
        .bind(role)
        .bind(message)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// All messages of a room, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn messages(&self, room_id: ChatRoomId) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r"
            SELECT id, chat_room_id, role, message, created_at
            FROM chatbot.chat_message
            WHERE chat_room_id = $1
            ORDER BY created_at ASC
            ",
        )
        .bind(room_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Switch a room between AI and human handling.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the room does not exist.
    #[instrument(skip(self), fields(chat_room_id = %room_id))]
    pub async fn set_live(&self, room_id: ChatRoomId, live: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE chatbot.chat_room
            SET live = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(room_id)
        .bind(live)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Atomically flip `mailed` from false to true.
    ///
    /// Returns `true` only for the caller that performed the flip.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(chat_room_id = %room_id))]
    pub async fn claim_mailed(&self, room_id: ChatRoomId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE chatbot.chat_room
            SET mailed = TRUE
            WHERE id = $1 AND mailed = FALSE
            ",
        )
        .bind(room_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Rooms of a domain, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_domain(
        &self,
        domain_id: DomainId,
    ) -> Result<Vec<RoomSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, RoomSummaryRow>(
            r"
            SELECT r.id, c.email AS customer_email, r.live, r.mailed, r.updated_at
            FROM chatbot.chat_room r
            JOIN chatbot.customer c ON c.id = r.customer_id
            WHERE c.domain_id = $1
            ORDER BY r.updated_at DESC
            ",
        )
        .bind(domain_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Domain and owner a room belongs to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn owner(&self, room_id: ChatRoomId) -> Result<Option<RoomOwner>, RepositoryError> {
        let row = sqlx::query_as::<_, RoomOwnerRow>(
            r"
            SELECT r.id AS room_id, d.id AS domain_id, d.name AS domain_name, d.owner_user_id
            FROM chatbot.chat_room r
            JOIN chatbot.customer c ON c.id = r.customer_id
            JOIN chatbot.domain d ON d.id = c.domain_id
            WHERE r.id = $1
            ",
        )
        .bind(room_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
