//! Database operations for customers and their chat rooms.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use udyog_core::{ChatRoomId, CustomerId, DomainId, Email};

use super::RepositoryError;
use crate::models::{ChatRoom, Customer, CustomerThread};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: CustomerId,
    domain_id: DomainId,
    email: Email,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            domain_id: row.domain_id,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ChatRoomRow {
    pub(super) id: ChatRoomId,
    pub(super) customer_id: CustomerId,
    pub(super) live: bool,
    pub(super) mailed: bool,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
}

impl From<ChatRoomRow> for ChatRoom {
    fn from(row: ChatRoomRow) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            live: row.live,
            mailed: row.mailed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ThreadRow {
    customer_id: CustomerId,
    domain_id: DomainId,
    email: Email,
    customer_created_at: DateTime<Utc>,
    room_id: ChatRoomId,
    live: bool,
    mailed: bool,
    room_created_at: DateTime<Utc>,
    room_updated_at: DateTime<Utc>,
}

impl From<ThreadRow> for CustomerThread {
    fn from(row: ThreadRow) -> Self {
        Self {
            customer: Customer {
                id: row.customer_id,
                domain_id: row.domain_id,
                email: row.email,
                created_at: row.customer_created_at,
            },
            room: ChatRoom {
                id: row.room_id,
                customer_id: row.customer_id,
                live: row.live,
                mailed: row.mailed,
                created_at: row.room_created_at,
                updated_at: row.room_updated_at,
            },
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for customer records.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a customer of a domain by exact, case-insensitive email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, email), fields(domain_id = %domain_id))]
    pub async fn find_thread(
        &self,
        domain_id: DomainId,
        email: &Email,
    ) -> Result<Option<CustomerThread>, RepositoryError> {
        let row = sqlx::query_as::<_, ThreadRow>(
            r"
            SELECT c.id AS customer_id,
                   c.domain_id,
                   c.email,
                   c.created_at AS customer_created_at,
                   r.id AS room_id,
                   r.live,
                   r.mailed,
                   r.created_at AS room_created_at,
                   r.updated_at AS room_updated_at
            FROM chatbot.customer c
            JOIN chatbot.chat_room r ON r.customer_id = c.id
            WHERE c.domain_id = $1 AND lower(c.email) = $2
            ",
        )
        .bind(domain_id)
        .bind(email.normalized())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a customer, one response per question and an empty chat room.
    ///
    /// All three inserts commit together or not at all.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered
    /// for the domain, `RepositoryError::Database` for other failures.
    #[instrument(skip(self, email, questions), fields(domain_id = %domain_id, questions = questions.len()))]
    pub async fn create_with_room(
        &self,
        domain_id: DomainId,
        email: &Email,
        questions: &[String],
    ) -> Result<CustomerThread, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let customer: Customer = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO chatbot.customer (domain_id, email)
            VALUES ($1, $2)
            RETURNING id, domain_id, email, created_at
            ",
        )
        .bind(domain_id)
        .bind(email)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "customer"))?
        .into();

        if !questions.is_empty() {
            sqlx::query(
                r"
                INSERT INTO chatbot.customer_response (customer_id, question)
                SELECT $1, q.question
                FROM unnest($2::text[]) WITH ORDINALITY AS q(question, ord)
                ORDER BY q.ord
                ",
            )
            .bind(customer.id)
            .bind(questions)
            .execute(&mut *tx)
            .await?;
        }

        let room: ChatRoom = sqlx::query_as::<_, ChatRoomRow>(
            r"
            INSERT INTO chatbot.chat_room (customer_id)
            VALUES ($1)
            RETURNING id, customer_id, live, mailed, created_at, updated_at
            ",
        )
        .bind(customer.id)
        .fetch_one(&mut *tx)
        .await?
        .into();

        tx.commit().await?;

        Ok(CustomerThread { customer, room })
    }
}
