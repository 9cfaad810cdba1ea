//! Database operations for domains and their widget configuration.

use sqlx::PgPool;
use tracing::instrument;

use udyog_core::{ChatBotId, DomainId, HelpDeskId};

use super::RepositoryError;
use crate::models::{AssistantDomain, ChatBotSettings, HelpDeskEntry, WidgetConfig};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct DomainRow {
    id: DomainId,
    name: String,
    owner_user_id: String,
}

#[derive(Debug, sqlx::FromRow)]
struct WidgetRow {
    name: String,
    chat_bot_id: Option<ChatBotId>,
    welcome_message: Option<String>,
    icon: Option<String>,
    text_color: Option<String>,
    background: Option<String>,
    help_desk: Option<bool>,
}

#[derive(Debug, sqlx::FromRow)]
struct HelpDeskRow {
    id: HelpDeskId,
    question: String,
    answer: String,
}

impl From<HelpDeskRow> for HelpDeskEntry {
    fn from(row: HelpDeskRow) -> Self {
        Self {
            id: row.id,
            question: row.question,
            answer: row.answer,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for domain lookups.
pub struct DomainRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DomainRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a domain with its unanswered filter questions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self), fields(domain_id = %id))]
    pub async fn assistant_domain(
        &self,
        id: DomainId,
    ) -> Result<Option<AssistantDomain>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, DomainRow>(
            r"
            SELECT id, name, owner_user_id
            FROM chatbot.domain
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let pending_questions: Vec<String> = sqlx::query_scalar(
            r"
            SELECT question
            FROM chatbot.filter_question
            WHERE domain_id = $1 AND answered IS NULL
            ORDER BY created_at ASC, question ASC
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(AssistantDomain {
            id: row.id,
            name: row.name,
            owner_user_id: row.owner_user_id,
            pending_questions,
        }))
    }

    /// Load the widget configuration for a domain.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self), fields(domain_id = %id))]
    pub async fn widget_config(&self, id: DomainId) -> Result<Option<WidgetConfig>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, WidgetRow>(
            r"
            SELECT d.name,
                   b.id AS chat_bot_id,
                   b.welcome_message,
                   b.icon,
                   b.text_color,
                   b.background,
                   b.help_desk
            FROM chatbot.domain d
            LEFT JOIN chatbot.chat_bot b ON b.domain_id = d.id
            WHERE d.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let helpdesk = sqlx::query_as::<_, HelpDeskRow>(
            r"
            SELECT id, question, answer
            FROM chatbot.help_desk
            WHERE domain_id = $1
            ORDER BY created_at ASC
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

        let chat_bot = row.chat_bot_id.map(|bot_id| ChatBotSettings {
            id: bot_id,
            welcome_message: row.welcome_message,
            icon: row.icon,
            text_color: row.text_color,
            background: row.background,
            helpdesk: row.help_desk.unwrap_or(false),
        });

        Ok(Some(WidgetConfig {
            name: row.name,
            chat_bot,
            helpdesk,
        }))
    }

    /// Owner user id of a domain.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn owner(&self, id: DomainId) -> Result<Option<String>, RepositoryError> {
        let owner = sqlx::query_scalar(
            r"
            SELECT owner_user_id
            FROM chatbot.domain
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(owner)
    }
}
