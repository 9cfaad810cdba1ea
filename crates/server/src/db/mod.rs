//! Database operations for the chatbot `PostgreSQL` schema.
//!
//! # Schema: `chatbot`
//!
//! ## Tables
//!
//! - `domain` - Tenant sites and their owning operator
//! - `chat_bot` - Widget appearance per domain
//! - `help_desk` - FAQ entries per domain
//! - `filter_question` - Qualification questions per domain
//! - `customer` - Visitors who left an email (unique per domain, case-insensitive)
//! - `customer_response` - Filter questions copied onto a customer
//! - `chat_room` - One conversation per customer with `live`/`mailed` flags
//! - `chat_message` - Append-only transcript
//! - `session` - Operator sessions (tower-sessions)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p udyog-cli -- migrate
//! ```
//!
//! Queries are checked at runtime (`sqlx::query_as` with `FromRow` rows) so
//! the workspace builds without a live database.

pub mod chat_rooms;
pub mod customers;
pub mod domains;
pub mod responses;
pub mod seed;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use chat_rooms::ChatRoomRepository;
pub use customers::CustomerRepository;
pub use domains::DomainRepository;
pub use responses::ResponseRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate customer email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-violation into `Conflict`, passing other errors through.
    pub(crate) fn from_insert(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(format!("{what} already exists"))
            }
            _ => Self::Database(err),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
