//! Integration tests for Udyog.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and start the server against a scratch database
//! cargo run -p udyog-cli -- migrate
//! cargo run -p udyog-server
//!
//! # Run the ignored, server-backed tests
//! cargo test -p udyog-integration-tests -- --ignored
//! ```
//!
//! `UDYOG_TEST_URL` points at the running server (default
//! `http://127.0.0.1:3000`); `DATABASE_URL` is used to seed fixtures.

use reqwest::Client;
use secrecy::SecretString;
use sqlx::PgPool;

use udyog_core::DomainId;
use udyog_server::db::seed::{SeedConfig, seed_from_config};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// A client pointed at a running server.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build HTTP client");
        let base_url = std::env::var("UDYOG_TEST_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self { client, base_url }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Connect to the test database.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is unset or the database is unreachable.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("UDYOG_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("DATABASE_URL must be set for integration tests");
    udyog_server::db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database")
}

/// Seed one domain with a unique name and the given filter questions.
///
/// # Panics
///
/// Panics if seeding fails.
pub async fn seed_domain(pool: &PgPool, questions: &[&str]) -> DomainId {
    let name = format!("Test Domain {}", uuid::Uuid::new_v4());
    let seed = serde_json::json!([{
        "name": name,
        "owner_user_id": "user_integration_test",
        "chatbot": {"welcome_message": "Hi!", "help_desk": true},
        "filter_questions": questions,
        "help_desk": [{"question": "Do you ship abroad?", "answer": "Yes."}],
    }]);
    let config: SeedConfig = serde_json::from_value(seed).expect("seed config");
    let result = seed_from_config(pool, config).await.expect("seed domain");
    result
        .inserted
        .first()
        .map(|(_, id)| *id)
        .expect("domain inserted")
}
