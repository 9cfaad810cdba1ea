//! Business logic services.
//!
//! # Services
//!
//! - `assistant` - AI sales assistant answering widget messages
//! - `conversation` - Operator access to chat rooms and realtime replies
//! - `email` - Handoff notifications via SMTP

pub mod assistant;
pub mod conversation;
pub mod email;

pub use assistant::{AssistantError, AssistantOutcome, AssistantService, IncomingMessage, PortalLinks};
pub use conversation::{ConversationError, ConversationService};
pub use email::{EmailError, EmailService};
