//! Database operations for customer responses to filter questions.

use sqlx::PgPool;
use tracing::instrument;

use udyog_core::{CustomerId, CustomerResponseId};

use super::RepositoryError;
use crate::models::CustomerResponse;

#[derive(Debug, sqlx::FromRow)]
struct ResponseRow {
    id: CustomerResponseId,
    customer_id: CustomerId,
    question: String,
    answered: Option<String>,
}

impl From<ResponseRow> for CustomerResponse {
    fn from(row: ResponseRow) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            question: row.question,
            answered: row.answered,
        }
    }
}

/// Repository for customer responses.
pub struct ResponseRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ResponseRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Unanswered responses of a customer in asking order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unanswered(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<CustomerResponse>, RepositoryError> {
        let rows = sqlx::query_as::<_, ResponseRow>(
            r"
            SELECT id, customer_id, question, answered
            FROM chatbot.customer_response
            WHERE customer_id = $1 AND answered IS NULL
            ORDER BY created_at ASC, question ASC
            ",
        )
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Record `answer` on the customer's oldest unanswered response.
    ///
    /// Returns the updated response, or `None` when every question already
    /// has an answer. An answer is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, answer), fields(customer_id = %customer_id))]
    pub async fn answer_oldest(
        &self,
        customer_id: CustomerId,
        answer: &str,
    ) -> Result<Option<CustomerResponse>, RepositoryError> {
        let row = sqlx::query_as::<_, ResponseRow>(
            r"
            UPDATE chatbot.customer_response
            SET answered = $2
            WHERE id = (
                SELECT id
                FROM chatbot.customer_response
                WHERE customer_id = $1 AND answered IS NULL
                ORDER BY created_at ASC, question ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            AND answered IS NULL
            RETURNING id, customer_id, question, answered
            ",
        )
        .bind(customer_id)
        .bind(answer)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
