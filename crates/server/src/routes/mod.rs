//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                               - Liveness check
//! GET  /health/ready                         - Readiness check (database)
//!
//! # Widget API (no session, rate limited, CORS)
//! GET  /chatbot/{domain_id}                  - Widget configuration
//! POST /chatbot/{domain_id}/messages         - Visitor message
//! GET  /chatbot/rooms/{room_id}/events       - Realtime events (SSE)
//!
//! # Auth
//! GET  /auth/sign-in                         - Sign-in notice
//! POST /auth/sign-in                         - Exchange a Clerk session
//! POST /auth/sign-out                        - Sign out
//!
//! # Dashboard (operator only)
//! GET  /dashboard/domains/{domain_id}/rooms  - Rooms of a domain
//! GET  /dashboard/rooms/{room_id}/messages   - Room transcript
//! POST /dashboard/rooms/{room_id}/messages   - Human reply
//! POST /dashboard/rooms/{room_id}/live       - Take over / hand back
//! ```

pub mod auth;
pub mod chatbot;
pub mod dashboard;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    routing::get,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::middleware::{auth_guard, create_session_layer, request_id_middleware, widget_rate_limiter};
use crate::state::AppState;

/// All application routes with their route-specific layers.
pub fn routes(state: &AppState) -> Router<AppState> {
    let operator = Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .layer(axum::middleware::from_fn(auth_guard))
        .layer(create_session_layer(state.pool(), state.config()));

    let widget = chatbot::router()
        .layer(widget_rate_limiter())
        .layer(widget_cors(&state.config().widget_origins));

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(widget)
        .merge(operator)
        .layer(axum::middleware::from_fn(request_id_middleware))
}

/// CORS for the widget API; an empty list allows any origin.
fn widget_cors(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn test_cors_preflight_from_listed_origin() {
        let app: Router = Router::new()
            .route("/chatbot/x", get(health))
            .layer(widget_cors(&["https://shop.example".to_string()]));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/chatbot/x")
                    .header(header::ORIGIN, "https://shop.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("https://shop.example")
        );
    }

    #[tokio::test]
    async fn test_health_is_ok() {
        assert_eq!(health().await, "ok");
    }
}
