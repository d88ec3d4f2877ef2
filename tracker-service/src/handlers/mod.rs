//! HTTP handlers for tracker-service.

pub mod api;
pub mod health;
pub mod organization;
pub mod project;
pub mod track;
pub mod usage;

pub use api::*;
pub use health::*;
pub use organization::*;
pub use project::*;
pub use track::*;
pub use usage::*;

use serde::Serialize;
use service_core::error::AppError;
use uuid::Uuid;

/// `{ "data": ... }` envelope used by the dashboard API.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// A present, non-blank query or body value.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse an identifier taken from the query string.
pub(crate) fn parse_id(value: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid {}", what)))
}
