//! Collaborators the assistant talks to, and their production bindings.

use async_trait::async_trait;
use sqlx::PgPool;

use udyog_core::{ChatRole, ChatRoomId, ChatTurn, CustomerId, DomainId, Email};

use crate::claude::{ClaudeClient, ClaudeError, GenerationParams};
use crate::db::{
    ChatRoomRepository, CustomerRepository, DomainRepository, RepositoryError, ResponseRepository,
};
use crate::identity::{ClerkClient, IdentityError};
use crate::models::{AssistantDomain, CustomerThread};
use crate::realtime::{RealtimeEvent, RealtimeHub};
use crate::services::email::{EmailError, EmailService};

/// Persistence needed for one assistant turn.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn assistant_domain(
        &self,
        domain_id: DomainId,
    ) -> Result<Option<AssistantDomain>, RepositoryError>;

    async fn find_customer(
        &self,
        domain_id: DomainId,
        email: &Email,
    ) -> Result<Option<CustomerThread>, RepositoryError>;

    /// Create the customer, one response per question and an empty room.
    async fn create_customer(
        &self,
        domain_id: DomainId,
        email: &Email,
        questions: &[String],
    ) -> Result<CustomerThread, RepositoryError>;

    async fn add_message(
        &self,
        room_id: ChatRoomId,
        role: ChatRole,
        message: &str,
    ) -> Result<(), RepositoryError>;

    async fn set_live(&self, room_id: ChatRoomId, live: bool) -> Result<(), RepositoryError>;

    /// Flip `mailed` on; `true` only for the caller that flipped it.
    async fn claim_mailed(&self, room_id: ChatRoomId) -> Result<bool, RepositoryError>;

    async fn unanswered_questions(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<String>, RepositoryError>;

    /// Answer the customer's oldest open question. Returns that question.
    async fn answer_next_question(
        &self,
        customer_id: CustomerId,
        answer: &str,
    ) -> Result<Option<String>, RepositoryError>;
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(
        &self,
        turns: &[ChatTurn],
        params: GenerationParams,
    ) -> Result<String, ClaudeError>;
}

pub trait Broadcaster: Send + Sync {
    /// Returns how many subscribers received the event.
    fn publish(&self, room_id: ChatRoomId, event: RealtimeEvent) -> usize;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_handoff(&self, to: &Email, domain_name: &str) -> Result<(), EmailError>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn primary_email(&self, user_id: &str) -> Result<Email, IdentityError>;
}

// =============================================================================
// Production bindings
// =============================================================================

#[async_trait]
impl ConversationStore for PgPool {
    async fn assistant_domain(
        &self,
        domain_id: DomainId,
    ) -> Result<Option<AssistantDomain>, RepositoryError> {
        DomainRepository::new(self).assistant_domain(domain_id).await
    }

    async fn find_customer(
        &self,
        domain_id: DomainId,
        email: &Email,
    ) -> Result<Option<CustomerThread>, RepositoryError> {
        CustomerRepository::new(self).find_thread(domain_id, email).await
    }

    async fn create_customer(
        &self,
        domain_id: DomainId,
        email: &Email,
        questions: &[String],
    ) -> Result<CustomerThread, RepositoryError> {
        CustomerRepository::new(self)
            .create_with_room(domain_id, email, questions)
            .await
    }

    async fn add_message(
        &self,
        room_id: ChatRoomId,
        role: ChatRole,
        message: &str,
    ) -> Result<(), RepositoryError> {
        ChatRoomRepository::new(self)
            .add_message(room_id, role, message)
            .await
            .map(|_| ())
    }

    async fn set_live(&self, room_id: ChatRoomId, live: bool) -> Result<(), RepositoryError> {
        ChatRoomRepository::new(self).set_live(room_id, live).await
    }

    async fn claim_mailed(&self, room_id: ChatRoomId) -> Result<bool, RepositoryError> {
        ChatRoomRepository::new(self).claim_mailed(room_id).await
    }

    async fn unanswered_questions(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<String>, RepositoryError> {
        let responses = ResponseRepository::new(self).unanswered(customer_id).await?;
        Ok(responses.into_iter().map(|r| r.question).collect())
    }

    async fn answer_next_question(
        &self,
        customer_id: CustomerId,
        answer: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let answered = ResponseRepository::new(self)
            .answer_oldest(customer_id, answer)
            .await?;
        Ok(answered.map(|r| r.question))
    }
}

#[async_trait]
impl LanguageModel for ClaudeClient {
    async fn generate(
        &self,
        turns: &[ChatTurn],
        params: GenerationParams,
    ) -> Result<String, ClaudeError> {
        self.complete_turns(turns, params).await
    }
}

impl Broadcaster for RealtimeHub {
    fn publish(&self, room_id: ChatRoomId, event: RealtimeEvent) -> usize {
        Self::publish(self, room_id, event)
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send_handoff(&self, to: &Email, domain_name: &str) -> Result<(), EmailError> {
        self.send_handoff_notice(to, domain_name).await
    }
}

#[async_trait]
impl IdentityProvider for ClerkClient {
    async fn primary_email(&self, user_id: &str) -> Result<Email, IdentityError> {
        Self::primary_email(self, user_id).await
    }
}
