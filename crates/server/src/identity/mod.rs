//! Clerk Backend API integration.
//!
//! Clerk owns operator accounts. This module resolves an operator's primary
//! email for handoff notifications and verifies dashboard sign-ins.

mod client;
mod error;
pub mod types;

pub use client::ClerkClient;
pub use error::IdentityError;
