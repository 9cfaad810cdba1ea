//! Public API used by the embedded chatbot widget.
//!
//! No session is read on these routes; they are rate limited per client IP
//! and open to the configured widget origins.

use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Response, Sse,
        sse::{Event, KeepAlive},
    },
    routing::{get, post},
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use udyog_core::{ChatRole, ChatRoomId, ChatTurn, DomainId, Email};

use crate::error::AppError;
use crate::realtime::REALTIME_EVENT;
use crate::services::{AssistantOutcome, IncomingMessage};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chatbot/{domain_id}", get(widget_config))
        .route("/chatbot/{domain_id}/messages", post(post_message))
        .route("/chatbot/rooms/{room_id}/events", get(room_events))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    /// Transcript so far, oldest first.
    #[serde(default)]
    pub chat: Vec<ChatTurn>,
    /// Always `user`; the widget cannot speak for the assistant.
    pub author: ChatRole,
    pub message: String,
    #[serde(default)]
    pub customer_email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyResponse {
    pub response: ChatTurn,
    pub chat_room: Option<ChatRoomId>,
    pub customer_email: Option<Email>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveResponse {
    pub live: bool,
    pub chat_room: ChatRoomId,
    pub customer_email: Email,
}

/// Appearance, name and help desk of a domain's chatbot.
#[instrument(skip(state))]
async fn widget_config(
    State(state): State<AppState>,
    Path(domain_id): Path<DomainId>,
) -> Result<Response, AppError> {
    let config = state
        .widget_config(domain_id)
        .await?
        .ok_or_else(|| AppError::NotFound("domain".to_string()))?;
    Ok(Json(config.as_ref()).into_response())
}

/// One visitor (or relayed) message; answers with a reply or the live flag.
async fn post_message(
    State(state): State<AppState>,
    Path(domain_id): Path<DomainId>,
    Json(request): Json<MessageRequest>,
) -> Response {
    let author = match visitor_author(request.author) {
        Ok(author) => author,
        Err(err) => return err.into_response(),
    };

    // An unusable address from the widget is treated as absent.
    let customer_email = request
        .customer_email
        .as_deref()
        .and_then(|email| Email::parse(email).ok());

    let outcome = state
        .assistant()
        .respond(IncomingMessage {
            domain_id,
            history: request.chat,
            author,
            message: request.message,
            customer_email,
        })
        .await;

    outcome_response(outcome)
}

fn visitor_author(author: ChatRole) -> Result<ChatRole, AppError> {
    match author {
        ChatRole::User => Ok(author),
        ChatRole::Assistant => Err(AppError::BadRequest(
            "author must be user".to_string(),
        )),
    }
}

fn outcome_response(outcome: AssistantOutcome) -> Response {
    match outcome {
        AssistantOutcome::Reply {
            content,
            chat_room,
            customer_email,
        } => Json(ReplyResponse {
            response: ChatTurn::assistant(content),
            chat_room,
            customer_email,
        })
        .into_response(),
        AssistantOutcome::Live {
            chat_room,
            customer_email,
        } => Json(LiveResponse {
            live: true,
            chat_room,
            customer_email,
        })
        .into_response(),
        AssistantOutcome::DomainMissing => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Server-sent `realtime-mode` events of one room.
async fn room_events(
    State(state): State<AppState>,
    Path(room_id): Path<ChatRoomId>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let events = state.realtime().stream(room_id).map(|event| {
        let json = serde_json::to_string(&event).unwrap_or_else(|_| r#"{"chat":null}"#.to_string());
        Ok(Event::default().event(REALTIME_EVENT).data(json))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[test]
    fn test_request_accepts_widget_payload() {
        let request: MessageRequest = serde_json::from_value(serde_json::json!({
            "chat": [{"role": "assistant", "content": "hi"}, {"role": "user", "content": "hello"}],
            "author": "user",
            "message": "hello",
            "customerEmail": "a@b.com"
        }))
        .expect("deserialize");
        assert_eq!(request.chat.len(), 2);
        assert_eq!(request.author, ChatRole::User);
        assert_eq!(request.customer_email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_request_without_history_or_email() {
        let request: MessageRequest =
            serde_json::from_str(r#"{"author":"user","message":"hi"}"#).expect("deserialize");
        assert!(request.chat.is_empty());
        assert!(request.customer_email.is_none());
    }

    #[test]
    fn test_widget_cannot_post_as_assistant() {
        assert_eq!(visitor_author(ChatRole::User).ok(), Some(ChatRole::User));
        let status = visitor_author(ChatRole::Assistant)
            .expect_err("assistant author rejected")
            .into_response()
            .status();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reply_shape() {
        let room = ChatRoomId::new(uuid::Uuid::nil());
        let response = outcome_response(AssistantOutcome::Reply {
            content: "Hello!".to_string(),
            chat_room: Some(room),
            customer_email: None,
        });
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "response": {"role": "assistant", "content": "Hello!"},
                "chatRoom": "00000000-0000-0000-0000-000000000000",
                "customerEmail": null
            })
        );
    }

    #[tokio::test]
    async fn test_live_shape() {
        let response = outcome_response(AssistantOutcome::Live {
            chat_room: ChatRoomId::new(uuid::Uuid::nil()),
            customer_email: Email::parse("a@b.com").expect("email"),
        });
        let json = body_json(response).await;
        assert_eq!(json["live"], true);
        assert_eq!(json["customerEmail"], "a@b.com");
    }

    #[test]
    fn test_missing_domain_is_no_content() {
        let response = outcome_response(AssistantOutcome::DomainMissing);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
