use axum::{Extension, Json};
use serde::Serialize;
use service_core::error::AppError;

use crate::middleware::Session;

#[derive(Debug, Serialize)]
pub struct HelloResponse {
    pub message: &'static str,
    pub session: Session,
}

/// GET /api
pub async fn hello(session: Option<Extension<Session>>) -> Result<Json<HelloResponse>, AppError> {
    let Extension(session) =
        session.ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Unauthorized")))?;

    Ok(Json(HelloResponse {
        message: "Hello LLM Tracker",
        session,
    }))
}
