//! Operator authentication: route policy, guard middleware and extractors.
//!
//! Paths fall into three groups. Public paths never need a session, the
//! widget API under `/chatbot` is ignored entirely, and everything else
//! requires a signed-in operator.

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentOperator, session::keys};

pub const SIGN_IN_PATH: &str = "/auth/sign-in";

const PUBLIC_PREFIXES: [&str; 5] = ["/auth", "/portal", "/images", "/favicon.ico", "/health"];
const IGNORED_PREFIXES: [&str; 1] = ["/chatbot"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePolicy {
    Public,
    /// No session lookup at all.
    Ignored,
    Protected,
}

impl RoutePolicy {
    #[must_use]
    pub fn classify(path: &str) -> Self {
        if IGNORED_PREFIXES.iter().any(|p| under(path, p)) {
            Self::Ignored
        } else if path == "/" || PUBLIC_PREFIXES.iter().any(|p| under(path, p)) {
            Self::Public
        } else {
            Self::Protected
        }
    }
}

fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

/// Rejection for requests without a signed-in operator.
pub enum OperatorAuthRejection {
    RedirectToSignIn,
    Unauthorized,
}

impl OperatorAuthRejection {
    fn for_headers(headers: &HeaderMap) -> Self {
        if wants_json(headers) {
            Self::Unauthorized
        } else {
            Self::RedirectToSignIn
        }
    }
}

impl IntoResponse for OperatorAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToSignIn => Redirect::to(SIGN_IN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

async fn current_operator(session: Option<&Session>) -> Option<CurrentOperator> {
    session?
        .get::<CurrentOperator>(keys::CURRENT_OPERATOR)
        .await
        .ok()
        .flatten()
}

/// Apply [`RoutePolicy`] to every request.
pub async fn auth_guard(request: Request, next: Next) -> Response {
    if RoutePolicy::classify(request.uri().path()) != RoutePolicy::Protected {
        return next.run(request).await;
    }

    let session = request.extensions().get::<Session>().cloned();
    let signed_in = current_operator(session.as_ref()).await.is_some();
    if !signed_in {
        return OperatorAuthRejection::for_headers(request.headers()).into_response();
    }
    next.run(request).await
}

/// Extractor for handlers that need the signed-in operator.
pub struct RequireOperator(pub CurrentOperator);

impl<S> FromRequestParts<S> for RequireOperator
where
    S: Send + Sync,
{
    type Rejection = OperatorAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_operator(parts.extensions.get::<Session>())
            .await
            .map(Self)
            .ok_or_else(|| OperatorAuthRejection::for_headers(&parts.headers))
    }
}

/// Store the signed-in operator in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_operator(
    session: &Session,
    operator: &CurrentOperator,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_OPERATOR, operator).await
}

/// Sign the operator out.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_operator(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_public_paths() {
        for path in ["/", "/auth/sign-in", "/portal/x/appointment/y", "/images/a.png", "/favicon.ico", "/health", "/health/ready"] {
            assert_eq!(RoutePolicy::classify(path), RoutePolicy::Public, "{path}");
        }
    }

    #[test]
    fn test_widget_api_is_ignored() {
        assert_eq!(RoutePolicy::classify("/chatbot"), RoutePolicy::Ignored);
        assert_eq!(
            RoutePolicy::classify("/chatbot/abc/messages"),
            RoutePolicy::Ignored
        );
    }

    #[test]
    fn test_everything_else_is_protected() {
        for path in ["/dashboard", "/dashboard/rooms/x/messages", "/authors", "/chatbots", "/settings"] {
            assert_eq!(RoutePolicy::classify(path), RoutePolicy::Protected, "{path}");
        }
    }

    #[test]
    fn test_json_clients_get_unauthorized() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            OperatorAuthRejection::for_headers(&headers),
            OperatorAuthRejection::RedirectToSignIn
        ));

        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let response = OperatorAuthRejection::for_headers(&headers).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_redirect_targets_sign_in() {
        let response = OperatorAuthRejection::RedirectToSignIn.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
            Some(SIGN_IN_PATH)
        );
    }
}
