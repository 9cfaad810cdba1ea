//! Operator dashboard API.
//!
//! Every route requires a signed-in operator and only reaches domains and
//! rooms that operator owns.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use udyog_core::{ChatRoomId, DomainId};

use crate::error::AppError;
use crate::middleware::RequireOperator;
use crate::models::{ChatMessage, RoomSummary};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/domains/{domain_id}/rooms", get(list_rooms))
        .route(
            "/dashboard/rooms/{room_id}/messages",
            get(list_messages).post(send_reply),
        )
        .route("/dashboard/rooms/{room_id}/live", post(set_live))
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LiveRequest {
    pub live: bool,
}

async fn list_rooms(
    State(state): State<AppState>,
    RequireOperator(operator): RequireOperator,
    Path(domain_id): Path<DomainId>,
) -> Result<Json<Vec<RoomSummary>>, AppError> {
    let rooms = state
        .conversations(&operator.user_id)
        .list_rooms(domain_id)
        .await?;
    Ok(Json(rooms))
}

async fn list_messages(
    State(state): State<AppState>,
    RequireOperator(operator): RequireOperator,
    Path(room_id): Path<ChatRoomId>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let messages = state
        .conversations(&operator.user_id)
        .messages(room_id)
        .await?;
    Ok(Json(messages))
}

/// Human reply, stored as an assistant message and pushed to the widget.
async fn send_reply(
    State(state): State<AppState>,
    RequireOperator(operator): RequireOperator,
    Path(room_id): Path<ChatRoomId>,
    Json(request): Json<ReplyRequest>,
) -> Result<Json<ChatMessage>, AppError> {
    let message = state
        .conversations(&operator.user_id)
        .reply(room_id, &request.message)
        .await?;
    Ok(Json(message))
}

async fn set_live(
    State(state): State<AppState>,
    RequireOperator(operator): RequireOperator,
    Path(room_id): Path<ChatRoomId>,
    Json(request): Json<LiveRequest>,
) -> Result<Json<LiveRequest>, AppError> {
    state
        .conversations(&operator.user_id)
        .set_live(room_id, request.live)
        .await?;
    Ok(Json(request))
}
