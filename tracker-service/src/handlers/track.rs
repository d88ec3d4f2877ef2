//! Public tracking endpoint called by client SDKs after each LLM request.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;
use validator::Validate;

use super::non_blank;
use crate::models::{NewUsageLog, UsageLog};
use crate::services::{
    price_usage, record_tracked_request, record_usage_cost, record_usage_tokens, TrackUsage,
};
use crate::startup::AppState;
use service_core::error::AppError;

// ============================================================================
// Request/Response DTOs
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct TrackRequest {
    pub model: Option<String>,
    pub provider: Option<String>,
    #[validate(range(min = 0, message = "prompt_tokens must be non-negative"))]
    pub prompt_tokens: Option<i64>,
    #[validate(range(min = 0, message = "completion_tokens must be non-negative"))]
    pub completion_tokens: Option<i64>,
    /// The project key issued when the project was created.
    pub api_key: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub id: Uuid,
    pub provider: String,
    pub model: String,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    pub currency: String,
    pub timestamp: DateTime<Utc>,
    pub status: &'static str,
}

impl From<UsageLog> for TrackResponse {
    fn from(log: UsageLog) -> Self {
        Self {
            id: log.id,
            provider: log.provider,
            model: log.model,
            prompt_tokens: log.prompt_tokens,
            completion_tokens: log.completion_tokens,
            total_tokens: log.total_tokens,
            input_cost: log.input_cost,
            output_cost: log.output_cost,
            total_cost: log.total_cost,
            currency: log.currency,
            timestamp: log.timestamp,
            status: "success",
        }
    }
}

struct ValidTrackRequest {
    api_key: String,
    usage: TrackUsage,
}

impl TrackRequest {
    /// Check presence first so missing fields are reported as such, then ranges.
    fn into_valid(self) -> Result<ValidTrackRequest, AppError> {
        let mut missing = Vec::new();
        let model = non_blank(self.model.clone());
        let api_key = non_blank(self.api_key.clone());
        if model.is_none() {
            missing.push("model".to_string());
        }
        if self.prompt_tokens.is_none() {
            missing.push("prompt_tokens".to_string());
        }
        if self.completion_tokens.is_none() {
            missing.push("completion_tokens".to_string());
        }
        if api_key.is_none() {
            missing.push("api_key".to_string());
        }

        let (Some(model), Some(prompt), Some(completion), Some(api_key)) =
            (model, self.prompt_tokens, self.completion_tokens, api_key)
        else {
            return Err(AppError::MissingFields(missing));
        };

        self.validate()?;

        Ok(ValidTrackRequest {
            api_key,
            usage: TrackUsage {
                model,
                provider: self.provider,
                prompt_tokens: prompt.unsigned_abs(),
                completion_tokens: completion.unsigned_abs(),
                currency: self.currency,
            },
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Price and record one LLM call.
///
/// POST /api/v1/track
pub async fn track_usage(
    State(state): State<AppState>,
    payload: Result<Json<TrackRequest>, JsonRejection>,
) -> Result<Json<TrackResponse>, AppError> {
    let started = Instant::now();
    track_usage_impl(&state, payload, started)
        .await
        .inspect_err(|e| record_tracked_request("unknown", e.kind()))
        .map(Json)
}

async fn track_usage_impl(
    state: &AppState,
    payload: Result<Json<TrackRequest>, JsonRejection>,
    started: Instant,
) -> Result<TrackResponse, AppError> {
    let Json(req) = payload?;
    let ValidTrackRequest { api_key, usage } = req.into_valid()?;

    let project = state
        .store
        .find_project_by_key(&api_key)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invalid project key")))?;

    let record = price_usage(&state.rates, &usage)?;
    let record = record.with_duration_ms(started.elapsed().as_millis() as u64);

    let log = state
        .store
        .insert_usage_log(&NewUsageLog {
            project_id: project.id,
            project_key: project.project_key.clone(),
            record,
        })
        .await?;

    record_tracked_request(&log.provider, "success");
    record_usage_tokens(
        &log.provider,
        usage.prompt_tokens,
        usage.completion_tokens,
    );
    record_usage_cost(&log.provider, &log.currency, log.total_cost);

    tracing::info!(
        project_id = %project.id,
        usage_id = %log.id,
        provider = %log.provider,
        model = %log.model,
        total_tokens = log.total_tokens,
        total_cost = log.total_cost,
        "Usage tracked"
    );

    Ok(TrackResponse::from(log))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TrackRequest {
        TrackRequest {
            model: Some("gpt-4o".to_string()),
            provider: None,
            prompt_tokens: Some(1000),
            completion_tokens: Some(500),
            api_key: Some("pk_test".to_string()),
            currency: None,
        }
    }

    #[test]
    fn test_valid_request() {
        let valid = request().into_valid().unwrap();
        assert_eq!(valid.api_key, "pk_test");
        assert_eq!(valid.usage.prompt_tokens, 1000);
        assert_eq!(valid.usage.completion_tokens, 500);
    }

    #[test]
    fn test_missing_fields_are_listed() {
        let req = TrackRequest {
            model: Some("  ".to_string()),
            api_key: None,
            ..request()
        };
        match req.into_valid() {
            Err(AppError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["model".to_string(), "api_key".to_string()]);
            }
            other => panic!("expected missing fields, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_zero_tokens_are_present() {
        let req = TrackRequest {
            prompt_tokens: Some(0),
            completion_tokens: Some(0),
            ..request()
        };
        assert!(req.into_valid().is_ok());
    }

    #[test]
    fn test_negative_tokens_fail_validation() {
        let req = TrackRequest {
            completion_tokens: Some(-5),
            ..request()
        };
        assert!(matches!(
            req.into_valid(),
            Err(AppError::ValidationError(_))
        ));
    }
}
