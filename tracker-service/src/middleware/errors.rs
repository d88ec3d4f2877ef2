//! Logs and counts handler failures once, at the route boundary.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use service_core::error::ErrorContext;

use crate::services::record_error;

pub async fn error_observer_middleware(req: Request, next: Next) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = req.method().clone();

    let response = next.run(req).await;

    if let Some(context) = response.extensions().get::<ErrorContext>() {
        if response.status().is_server_error() {
            tracing::error!(error = %context.message, %method, endpoint, "Request failed");
        } else {
            tracing::warn!(error = %context.message, %method, endpoint, "Request rejected");
        }
        record_error(context.kind, &endpoint);
    }

    response
}
