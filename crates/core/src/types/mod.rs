//! Core types for Udyog.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod chat;
pub mod email;
pub mod id;

pub use chat::{ChatRole, ChatTurn};
pub use email::{Email, EmailError};
pub use id::*;
