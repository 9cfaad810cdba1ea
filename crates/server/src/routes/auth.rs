//! Operator sign-in backed by Clerk sessions.
//!
//! The dashboard front-end signs in with Clerk and posts the resulting
//! session id and token here; the verified user id is kept in the server
//! session.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::post,
};
use askama::Template;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::identity::IdentityError;
use crate::middleware::{clear_current_operator, set_current_operator};
use crate::models::CurrentOperator;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-in", post(sign_in).get(sign_in_page))
        .route("/auth/sign-out", post(sign_out))
}

#[derive(Template)]
#[template(path = "auth/sign_in.html")]
struct SignInTemplate;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub session_id: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub user_id: String,
}

async fn sign_in_page() -> Result<Html<String>, AppError> {
    SignInTemplate
        .render()
        .map(Html)
        .map_err(|e| AppError::Internal(e.to_string()))
}

#[instrument(skip(state, session, request))]
async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, AppError> {
    let user_id = state
        .clerk()
        .verify_session(&request.session_id, &request.token)
        .await
        .map_err(|err| match err {
            IdentityError::InactiveSession(_) | IdentityError::NotFound(_) => {
                AppError::Unauthorized("invalid session".to_string())
            }
            IdentityError::Api { status, .. } if (400..500).contains(&status) => {
                AppError::Unauthorized("invalid session".to_string())
            }
            other => AppError::Identity(other),
        })?;

    let operator = CurrentOperator {
        user_id: user_id.clone(),
    };
    set_current_operator(&session, &operator)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&user_id);
    info!(%user_id, "Operator signed in");

    Ok(Json(SignInResponse { user_id }))
}

async fn sign_out(session: Session) -> Result<impl IntoResponse, AppError> {
    clear_current_operator(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
