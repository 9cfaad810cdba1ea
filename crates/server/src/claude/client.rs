//! Claude API client for chat completions.

use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;

use udyog_core::{ChatRole, ChatTurn};

use crate::config::ClaudeConfig;

use super::error::{ApiErrorResponse, ClaudeError};
use super::types::{ChatRequest, ChatResponse, GenerationParams, Message};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Claude API client.
///
/// Cheap to clone; the HTTP connection pool is shared.
#[derive(Clone)]
pub struct ClaudeClient {
    inner: Arc<ClaudeClientInner>,
}

struct ClaudeClientInner {
    client: reqwest::Client,
    model: String,
}

impl ClaudeClient {
    /// Create a new Claude client.
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::Config` if the API key is not a valid header
    /// value or the HTTP client cannot be built.
    pub fn new(config: &ClaudeConfig) -> Result<Self, ClaudeError> {
        let api_key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|e| ClaudeError::Config(format!("invalid API key header: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", api_key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ClaudeError::Config(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(ClaudeClientInner {
                client,
                model: config.model.clone(),
            }),
        })
    }

    /// Model ID every request is sent to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Send a chat request and return the complete response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error
    /// response.
    #[instrument(skip(self, messages, system), fields(model = %self.inner.model, turns = messages.len()))]
    pub async fn chat(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        params: GenerationParams,
    ) -> Result<ChatResponse, ClaudeError> {
        let request = ChatRequest {
            model: self.inner.model.clone(),
            max_tokens: params.max_tokens,
            messages,
            system,
            temperature: params.temperature,
            top_p: params.top_p,
        };

        let response = self
            .inner
            .client
            .post(ANTHROPIC_API_URL)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_status(status, response).await);
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ClaudeError::Parse(format!("Failed to parse response: {e}")))?;

        tracing::debug!(
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            stop_reason = ?parsed.stop_reason,
            "Claude completion finished"
        );

        Ok(parsed)
    }

    /// Complete a widget transcript and return the reply text.
    ///
    /// # Errors
    ///
    /// See [`ClaudeClient::chat`].
    pub async fn complete_turns(
        &self,
        turns: &[ChatTurn],
        params: GenerationParams,
    ) -> Result<String, ClaudeError> {
        let response = self.chat(to_messages(turns), None, params).await?;
        Ok(response.text())
    }

    async fn handle_error_status(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> ClaudeError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return ClaudeError::RateLimited(retry_after);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return ClaudeError::Unauthorized("Invalid API key".to_string());
        }

        match response.text().await {
            Ok(body) => match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_error) => ClaudeError::Api {
                    error_type: api_error.error.error_type,
                    message: api_error.error.message,
                },
                Err(_) => ClaudeError::Api {
                    error_type: status.as_u16().to_string(),
                    message: body,
                },
            },
            Err(e) => ClaudeError::Http(e),
        }
    }
}

/// Convert widget turns into API messages.
///
/// The Messages API requires roles to alternate, so consecutive turns from
/// the same author are joined with a blank line.
pub(crate) fn to_messages(turns: &[ChatTurn]) -> Vec<Message> {
    let mut messages: Vec<Message> = Vec::with_capacity(turns.len());
    for turn in turns {
        let role = match turn.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        };
        match messages.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(&turn.content);
            }
            _ => messages.push(Message {
                role: role.to_string(),
                content: turn.content.clone(),
            }),
        }
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_messages_merges_consecutive_roles() {
        let turns = vec![
            ChatTurn::user("prompt\n\nhello"),
            ChatTurn::assistant("Hi! What's your email?"),
            ChatTurn::user("a@b.com"),
            ChatTurn::user("a@b.com"),
        ];
        let messages = to_messages(&turns);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[2].content, "a@b.com\n\na@b.com");
    }

    #[test]
    fn test_to_messages_empty() {
        assert!(to_messages(&[]).is_empty());
    }

    #[test]
    fn test_claude_client_is_send_sync_clone() {
        fn assert_traits<T: Send + Sync + Clone>() {}
        assert_traits::<ClaudeClient>();
    }
}
