//! Domain models for the chatbot backend.
//!
//! These are validated domain types; database row types live next to their
//! queries in [`crate::db`].

pub mod chat;
pub mod customer;
pub mod domain;
pub mod session;

pub use chat::{ChatMessage, ChatRoom, RoomOwner, RoomSummary};
pub use customer::{Customer, CustomerResponse, CustomerThread};
pub use domain::{AssistantDomain, ChatBotSettings, HelpDeskEntry, WidgetConfig};
pub use session::CurrentOperator;
