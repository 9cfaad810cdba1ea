//! Seed domains, chatbot settings, filter questions and help desk entries
//! from YAML.
//!
//! ## YAML Format
//!
//! ```yaml
//! - name: Acme
//!   owner_user_id: user_2abc123
//!   chatbot:
//!     welcome_message: "Hi! How can we help?"
//!     text_color: "#ffffff"
//!     background: "#4f46e5"
//!     help_desk: true
//!   filter_questions:
//!     - "What's your budget?"
//!   help_desk:
//!     - question: "Do you ship abroad?"
//!       answer: "Yes, worldwide."
//! ```
//!
//! A domain whose name and owner already exist is skipped, so the file can be
//! applied repeatedly.

use std::path::Path;

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

use udyog_core::DomainId;

use super::RepositoryError;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid seed file: {0}")]
    Invalid(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for SeedError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

#[derive(Debug, Deserialize)]
pub struct DomainSeed {
    pub name: String,
    pub owner_user_id: String,
    #[serde(default)]
    pub chatbot: Option<ChatBotSeed>,
    #[serde(default)]
    pub filter_questions: Vec<String>,
    #[serde(default)]
    pub help_desk: Vec<HelpDeskSeed>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatBotSeed {
    pub welcome_message: Option<String>,
    pub icon: Option<String>,
    pub text_color: Option<String>,
    pub background: Option<String>,
    #[serde(default)]
    pub help_desk: bool,
}

#[derive(Debug, Deserialize)]
pub struct HelpDeskSeed {
    pub question: String,
    pub answer: String,
}

pub type SeedConfig = Vec<DomainSeed>;

/// Result of a seeding run.
#[derive(Debug, Default)]
pub struct SeedResult {
    /// Newly inserted domains with their generated ids.
    pub inserted: Vec<(String, DomainId)>,
    /// Names of domains that already existed.
    pub skipped: Vec<String>,
    pub questions_inserted: u64,
    pub help_desk_inserted: u64,
}

/// Check a parsed seed file for obvious mistakes.
///
/// Returns one message per problem; an empty vector means the file is usable.
#[must_use]
pub fn validate_config(config: &SeedConfig) -> Vec<String> {
    let mut errors = Vec::new();
    for (idx, domain) in config.iter().enumerate() {
        let label = if domain.name.trim().is_empty() {
            errors.push(format!("entry {idx}: name is empty"));
            format!("entry {idx}")
        } else {
            domain.name.clone()
        };
        if domain.owner_user_id.trim().is_empty() {
            errors.push(format!("{label}: owner_user_id is empty"));
        }
        if domain.filter_questions.iter().any(|q| q.trim().is_empty()) {
            errors.push(format!("{label}: filter question is empty"));
        }
        if domain
            .help_desk
            .iter()
            .any(|h| h.question.trim().is_empty() || h.answer.trim().is_empty())
        {
            errors.push(format!("{label}: help desk entry needs question and answer"));
        }
    }
    errors
}

/// Parse and apply a seed file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated, or if a
/// database write fails.
#[instrument(skip(pool), fields(path = %path.as_ref().display()))]
pub async fn seed_from_file<P: AsRef<Path>>(
    pool: &PgPool,
    path: P,
) -> Result<SeedResult, SeedError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;

    let config: SeedConfig = serde_yaml::from_str(&content)?;
    let errors = validate_config(&config);
    if !errors.is_empty() {
        return Err(SeedError::Invalid(errors.join("; ")));
    }

    seed_from_config(pool, config).await
}

/// Apply an already parsed seed configuration, one transaction per domain.
///
/// # Errors
///
/// Returns an error if a database write fails. Domains committed before the
/// failure stay committed.
#[instrument(skip(pool, config), fields(domains = config.len()))]
pub async fn seed_from_config(pool: &PgPool, config: SeedConfig) -> Result<SeedResult, SeedError> {
    let mut result = SeedResult::default();

    for domain in config {
        let mut tx = pool.begin().await?;

        let existing: Option<DomainId> = sqlx::query_scalar(
            r"
            SELECT id FROM chatbot.domain
            WHERE name = $1 AND owner_user_id = $2
            ",
        )
        .bind(&domain.name)
        .bind(&domain.owner_user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_some() {
            info!(domain = %domain.name, "Domain already seeded, skipping");
            result.skipped.push(domain.name);
            continue;
        }

        let domain_id: DomainId = sqlx::query_scalar(
            r"
            INSERT INTO chatbot.domain (name, owner_user_id)
            VALUES ($1, $2)
            RETURNING id
            ",
        )
        .bind(&domain.name)
        .bind(&domain.owner_user_id)
        .fetch_one(&mut *tx)
        .await?;

        let bot = domain.chatbot.unwrap_or_default();
        sqlx::query(
            r"
            INSERT INTO chatbot.chat_bot
                (domain_id, welcome_message, icon, text_color, background, help_desk)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(domain_id)
        .bind(bot.welcome_message)
        .bind(bot.icon)
        .bind(bot.text_color)
        .bind(bot.background)
        .bind(bot.help_desk)
        .execute(&mut *tx)
        .await?;

        for question in &domain.filter_questions {
            sqlx::query(
                r"
                INSERT INTO chatbot.filter_question (domain_id, question)
                VALUES ($1, $2)
                ",
            )
            .bind(domain_id)
            .bind(question)
            .execute(&mut *tx)
            .await?;
            result.questions_inserted += 1;
        }

        for entry in &domain.help_desk {
            sqlx::query(
                r"
                INSERT INTO chatbot.help_desk (domain_id, question, answer)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(domain_id)
            .bind(&entry.question)
            .bind(&entry.answer)
            .execute(&mut *tx)
            .await?;
            result.help_desk_inserted += 1;
        }

        tx.commit().await?;
        info!(domain = %domain.name, %domain_id, "Seeded domain");
        result.inserted.push((domain.name, domain_id));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
- name: Acme
  owner_user_id: user_2abc123
  chatbot:
    welcome_message: "Hi! How can we help?"
    background: "#4f46e5"
    help_desk: true
  filter_questions:
    - "What's your budget?"
  help_desk:
    - question: "Do you ship abroad?"
      answer: "Yes, worldwide."
- name: Bare
  owner_user_id: user_9xyz
"##;

    #[test]
    fn test_parse_sample() {
        let config: SeedConfig = serde_yaml::from_str(SAMPLE).expect("parse");
        assert_eq!(config.len(), 2);
        assert_eq!(config[0].filter_questions, vec!["What's your budget?"]);
        assert!(config[0].chatbot.as_ref().is_some_and(|b| b.help_desk));
        assert!(config[1].chatbot.is_none());
        assert!(config[1].help_desk.is_empty());
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_validate_reports_blank_fields() {
        let config: SeedConfig = serde_yaml::from_str(
            r#"
- name: ""
  owner_user_id: " "
  filter_questions: [""]
  help_desk:
    - question: "Q"
      answer: ""
"#,
        )
        .expect("parse");
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 4);
        assert!(errors[0].contains("name is empty"));
    }
}
