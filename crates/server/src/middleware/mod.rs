//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Operator routes: session layer, then the auth guard
//! 5. Widget routes: CORS, then per-IP rate limiting

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{
    RequireOperator, RoutePolicy, auth_guard, clear_current_operator, set_current_operator,
};
pub use rate_limit::widget_rate_limiter;
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
