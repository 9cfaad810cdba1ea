//! Claude API integration for the support assistant.
//!
//! A thin, non-streaming client for the Anthropic Messages API. The assistant
//! sends the whole widget transcript on every turn; nothing is stored on the
//! Anthropic side.

mod client;
mod error;
pub mod types;

pub use client::ClaudeClient;
pub use error::ClaudeError;
pub use types::{ChatResponse, GenerationParams, Message};
