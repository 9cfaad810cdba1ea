//! Sales assistant that answers chatbot widget messages.
//!
//! One call to [`AssistantService::respond`] handles one visitor message:
//!
//! 1. Resolve the domain and the visitor's email for this turn.
//! 2. A first-time email gets a welcome reply and a fresh chat room.
//! 3. A room in realtime mode bypasses the model; the message is relayed to
//!    the operator and the owner is mailed once.
//! 4. Everything else goes to the model, whose reply may escalate to a
//!    human, record a qualification answer, or carry a portal link.
//!
//! Failures never reach the visitor: they are logged, captured by Sentry and
//! replaced with [`FALLBACK_REPLY`].

mod deps;
mod prompt;
mod reply;
mod scan;


use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use udyog_core::{ChatRole, ChatRoomId, ChatTurn, CustomerId, DomainId, Email};

use crate::claude::{ClaudeError, GenerationParams};
use crate::db::RepositoryError;
use crate::identity::IdentityError;
use crate::models::{AssistantDomain, CustomerThread};
use crate::realtime::RealtimeEvent;

pub use deps::{Broadcaster, ConversationStore, IdentityProvider, LanguageModel, Mailer};
pub use prompt::{CUSTOMER_ID_PLACEHOLDER, PortalLinks, build_conversation, render_prompt};
pub use reply::{COMPLETE_MARKER, ModelReply, REALTIME_MARKER, ReplyKind, link_reply};
pub use scan::{first_email, first_url};

/// Sent instead of any reply when the turn fails.
pub const FALLBACK_REPLY: &str = "I'm having trouble responding. Please try again later.";

/// Sent when the model answers with nothing.
pub const EMPTY_REPLY: &str = "Please Wait for the reply....";

/// Fixed sampling settings for every assistant turn.
pub const GENERATION: GenerationParams = GenerationParams {
    max_tokens: 1024,
    temperature: 0.8,
    top_p: 1.0,
};

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("model request failed: {0}")]
    Model(#[from] ClaudeError),

    #[error("owner lookup failed: {0}")]
    Identity(#[from] IdentityError),

    #[error("prompt rendering failed: {0}")]
    Prompt(#[from] askama::Error),
}

/// One message posted by the widget.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub domain_id: DomainId,
    /// Transcript as the widget holds it, oldest first, without `message`.
    pub history: Vec<ChatTurn>,
    pub author: ChatRole,
    pub message: String,
    /// Email the widget learned on an earlier turn.
    pub customer_email: Option<Email>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantOutcome {
    /// Show `content` as an assistant message.
    Reply {
        content: String,
        chat_room: Option<ChatRoomId>,
        customer_email: Option<Email>,
    },
    /// The room is handled by a human; the widget should listen for
    /// realtime events instead of expecting a reply.
    Live {
        chat_room: ChatRoomId,
        customer_email: Email,
    },
    DomainMissing,
}

/// Greeting for a visitor who just gave their email.
#[must_use]
pub fn welcome_reply(email: &Email) -> String {
    format!(
        "Welcome aboard {}! I'm glad to connect with you. Is there anything you need help with?",
        email.local_part()
    )
}

/// Email for this turn: the new message wins, then the one the widget
/// carried over, then the latest one the visitor typed earlier.
#[must_use]
pub fn resolve_customer_email(
    message: &str,
    carried: Option<&Email>,
    history: &[ChatTurn],
) -> Option<Email> {
    scan::first_email(message)
        .or_else(|| carried.cloned())
        .or_else(|| {
            history
                .iter()
                .rev()
                .filter(|turn| turn.role == ChatRole::User)
                .find_map(|turn| scan::emails(&turn.content).last())
        })
}

/// Orchestrates one assistant turn over its collaborators.
pub struct AssistantService<'a, S, M, B, N, I> {
    store: &'a S,
    model: &'a M,
    broadcaster: &'a B,
    mailer: &'a N,
    identity: &'a I,
    links: &'a PortalLinks,
}

impl<'a, S, M, B, N, I> AssistantService<'a, S, M, B, N, I>
where
    S: ConversationStore,
    M: LanguageModel,
    B: Broadcaster,
    N: Mailer,
    I: IdentityProvider,
{
    #[must_use]
    pub const fn new(
        store: &'a S,
        model: &'a M,
        broadcaster: &'a B,
        mailer: &'a N,
        identity: &'a I,
        links: &'a PortalLinks,
    ) -> Self {
        Self {
            store,
            model,
            broadcaster,
            mailer,
            identity,
            links,
        }
    }

    /// Answer one widget message.
    #[instrument(skip(self, incoming), fields(domain_id = %incoming.domain_id, author = %incoming.author))]
    pub async fn respond(&self, incoming: IncomingMessage) -> AssistantOutcome {
        let customer_email = resolve_customer_email(
            &incoming.message,
            incoming.customer_email.as_ref(),
            &incoming.history,
        );

        match self.try_respond(&incoming, customer_email.as_ref()).await {
            Ok(outcome) => outcome,
            Err(err) => {
                sentry::capture_error(&err);
                error!(error = %err, "Assistant turn failed");
                AssistantOutcome::Reply {
                    content: FALLBACK_REPLY.to_string(),
                    chat_room: None,
                    customer_email,
                }
            }
        }
    }

    async fn try_respond(
        &self,
        incoming: &IncomingMessage,
        email: Option<&Email>,
    ) -> Result<AssistantOutcome, AssistantError> {
        let Some(domain) = self.store.assistant_domain(incoming.domain_id).await? else {
            warn!("Chatbot message for unknown domain");
            return Ok(AssistantOutcome::DomainMissing);
        };

        let thread = match email {
            Some(email) => match self.store.find_customer(domain.id, email).await? {
                Some(thread) => Some(thread),
                None => {
                    let thread = self
                        .store
                        .create_customer(domain.id, email, &domain.pending_questions)
                        .await?;
                    info!(customer_id = %thread.customer.id, chat_room_id = %thread.room.id, "New customer");
                    return Ok(AssistantOutcome::Reply {
                        content: welcome_reply(email),
                        chat_room: Some(thread.room.id),
                        customer_email: Some(email.clone()),
                    });
                }
            },
            None => None,
        };

        if let Some(thread) = thread.as_ref().filter(|t| t.room.live) {
            self.relay_live(&domain, thread, incoming).await?;
            return Ok(AssistantOutcome::Live {
                chat_room: thread.room.id,
                customer_email: thread.customer.email.clone(),
            });
        }

        let room_id = thread.as_ref().map(|t| t.room.id);
        let customer_id = thread.as_ref().map(|t| t.customer.id);
        let content = self
            .converse(&domain, room_id, customer_id, incoming)
            .await?;

        Ok(AssistantOutcome::Reply {
            content,
            chat_room: room_id,
            customer_email: email.cloned(),
        })
    }

    /// Pass a visitor message straight to the operator.
    async fn relay_live(
        &self,
        domain: &AssistantDomain,
        thread: &CustomerThread,
        incoming: &IncomingMessage,
    ) -> Result<(), AssistantError> {
        let room_id = thread.room.id;
        self.store
            .add_message(room_id, incoming.author, &incoming.message)
            .await?;

        let delivered = self.broadcaster.publish(
            room_id,
            RealtimeEvent::new(incoming.author, incoming.message.clone()),
        );
        debug!(chat_room_id = %room_id, delivered, "Relayed message to realtime channel");

        if thread.room.mailed {
            return Ok(());
        }

        // Resolve the owner before claiming; a failed lookup stays retryable.
        let owner_email = self.identity.primary_email(&domain.owner_user_id).await?;
        if self.store.claim_mailed(room_id).await? {
            match self.mailer.send_handoff(&owner_email, &domain.name).await {
                Ok(()) => info!(chat_room_id = %room_id, "Owner notified of live conversation"),
                Err(err) => {
                    warn!(chat_room_id = %room_id, error = %err, "Failed to send handoff email");
                }
            }
        }

        Ok(())
    }

    /// Run the model over the conversation and act on its reply.
    async fn converse(
        &self,
        domain: &AssistantDomain,
        room_id: Option<ChatRoomId>,
        customer_id: Option<CustomerId>,
        incoming: &IncomingMessage,
    ) -> Result<String, AssistantError> {
        if let Some(room_id) = room_id {
            self.store
                .add_message(room_id, incoming.author, &incoming.message)
                .await?;
        } else {
            debug!("No chat room for this visitor yet, message not stored");
        }

        let questions = match customer_id {
            Some(id) => self.store.unanswered_questions(id).await?,
            None => domain.pending_questions.clone(),
        };
        let prompt = render_prompt(&domain.name, domain.id, customer_id, &questions, self.links)?;
        let turns = build_conversation(
            &prompt,
            &incoming.history,
            incoming.author,
            &incoming.message,
        );

        let raw = self.model.generate(&turns, GENERATION).await?;
        let raw = if raw.trim().is_empty() {
            EMPTY_REPLY.to_string()
        } else {
            raw
        };

        let reply = ModelReply::parse(&raw, incoming.history.last());
        match reply.kind {
            ReplyKind::Escalate => {
                if let Some(room_id) = room_id {
                    self.store.set_live(room_id, true).await?;
                    self.store
                        .add_message(room_id, ChatRole::Assistant, &reply.text)
                        .await?;
                    info!(chat_room_id = %room_id, "Conversation escalated to realtime");
                } else {
                    warn!("Escalation requested before the visitor has a chat room");
                }
                return Ok(reply.text);
            }
            ReplyKind::AnswerCapture => match customer_id {
                Some(id) => {
                    match self.store.answer_next_question(id, &incoming.message).await? {
                        Some(question) => debug!(%question, "Captured qualification answer"),
                        None => debug!("No open question left to answer"),
                    }
                }
                None => debug!("Answer given before the visitor left an email, not recorded"),
            },
            ReplyKind::Reply => {}
        }

        let content = reply.outgoing();
        if let Some(room_id) = room_id {
            self.store
                .add_message(room_id, ChatRole::Assistant, &content)
                .await?;
        }
        Ok(content)
    }
}
