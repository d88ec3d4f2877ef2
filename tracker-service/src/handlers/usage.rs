//! Usage log listing and dashboard aggregates.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::{non_blank, parse_id, DataResponse};
use crate::models::{TimeRange, UsageLog, UsageSummary};
use crate::startup::AppState;
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageQuery {
    pub project_id: Option<String>,
    pub range: Option<String>,
}

impl UsageQuery {
    fn project_id(&self) -> Result<uuid::Uuid, AppError> {
        let id = non_blank(self.project_id.clone())
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing required parameters")))?;
        parse_id(&id, "project ID")
    }

    fn range(&self) -> Result<TimeRange, AppError> {
        match non_blank(self.range.clone()) {
            Some(range) => range
                .parse()
                .map_err(|e: String| AppError::BadRequest(anyhow::anyhow!(e))),
            None => Ok(TimeRange::default()),
        }
    }
}

/// GET /api/v1/usage?projectId=
pub async fn list_usage(
    State(state): State<AppState>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<DataResponse<Vec<UsageLog>>>, AppError> {
    let project_id = query.project_id()?;
    let logs = state.store.list_usage_logs(project_id, None).await?;
    Ok(Json(DataResponse::new(logs)))
}

/// GET /api/v1/usage/summary?projectId=&range=7d|30d|90d
pub async fn usage_summary(
    State(state): State<AppState>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<DataResponse<UsageSummary>>, AppError> {
    let project_id = query.project_id()?;
    let range = query.range()?;
    let now = Utc::now();

    // Two windows are needed for the period-over-period change.
    let logs = state
        .store
        .list_usage_logs(project_id, Some(range.previous_cutoff(now)))
        .await?;

    Ok(Json(DataResponse::new(UsageSummary::from_logs(
        &logs, range, now,
    ))))
}
