//! Usage record and usage log models.

use crate::pricing::{CostBreakdown, Provider};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_CURRENCY: &str = "USD";

/// A priced LLM call, produced once per tracking request and never mutated.
///
/// `total_tokens` and `total_cost` are always the sums of their parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRecord {
    pub model: String,
    pub provider: Provider,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    pub currency: String,
    pub request_duration_ms: u64,
    pub status_code: i32,
    pub error_message: Option<String>,
}

impl UsageRecord {
    /// Build a successful record from token counts and their computed cost.
    pub fn new(
        model: impl Into<String>,
        provider: Provider,
        prompt_tokens: u64,
        completion_tokens: u64,
        cost: CostBreakdown,
        currency: Option<String>,
    ) -> Self {
        Self {
            model: model.into(),
            provider,
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            input_cost: cost.input_cost,
            output_cost: cost.output_cost,
            total_cost: cost.input_cost + cost.output_cost,
            currency: currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            request_duration_ms: 0,
            status_code: 200,
            error_message: None,
        }
    }

    pub fn with_duration_ms(mut self, request_duration_ms: u64) -> Self {
        self.request_duration_ms = request_duration_ms;
        self
    }
}

/// Input for persisting a usage record against a project.
#[derive(Debug, Clone)]
pub struct NewUsageLog {
    pub project_id: Uuid,
    pub project_key: String,
    pub record: UsageRecord,
}

/// Persisted usage log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UsageLog {
    pub id: Uuid,
    pub project_id: Uuid,
    pub project_key: String,
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub provider: String,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    pub currency: String,
    pub request_duration_ms: i64,
    pub status_code: i32,
    pub error_message: Option<String>,
}

impl UsageLog {
    /// Materialize a log row, saturating counters that exceed the column range.
    pub fn new(input: &NewUsageLog) -> Self {
        let record = &input.record;
        Self {
            id: Uuid::new_v4(),
            project_id: input.project_id,
            project_key: input.project_key.clone(),
            timestamp: Utc::now(),
            model: record.model.clone(),
            provider: record.provider.to_string(),
            prompt_tokens: to_db_int(record.prompt_tokens),
            completion_tokens: to_db_int(record.completion_tokens),
            total_tokens: to_db_int(record.total_tokens),
            input_cost: record.input_cost,
            output_cost: record.output_cost,
            total_cost: record.total_cost,
            currency: record.currency.clone(),
            request_duration_ms: to_db_int(record.request_duration_ms),
            status_code: record.status_code,
            error_message: record.error_message.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

fn to_db_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
