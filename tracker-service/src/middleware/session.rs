//! Session gate in front of the dashboard API.
//!
//! Sessions are issued and validated by the external auth layer; this gate
//! only requires that one of its session cookies is present.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use service_core::error::AppError;

use crate::config::SessionConfig;
use crate::services::record_error;
use crate::startup::AppState;

/// Paths reachable without a session.
pub const PUBLIC_PATH_PREFIXES: &[&str] = &[
    "/health",
    "/ready",
    "/metrics",
    "/api/auth",
    "/api/v1/track",
];

/// Marker inserted into request extensions when a session cookie is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub cookie_name: String,
}

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATH_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// Name of the first configured session cookie with a non-empty value.
fn find_session_cookie(jar: &CookieJar, config: &SessionConfig) -> Option<String> {
    config
        .cookie_names
        .iter()
        .find(|name| jar.get(name.as_str()).is_some_and(|c| !c.value().is_empty()))
        .cloned()
}

pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let session = find_session_cookie(&jar, &state.config.session);

    match session {
        Some(cookie_name) => {
            req.extensions_mut().insert(Session { cookie_name });
        }
        None if state.config.session.required && !is_public_path(req.uri().path()) => {
            tracing::debug!(path = %req.uri().path(), "Rejected request without session");
            record_error("unauthorized", "session");
            return AppError::Unauthorized(anyhow::anyhow!("Unauthorized")).into_response();
        }
        None => {}
    }

    next.run(req).await
}
