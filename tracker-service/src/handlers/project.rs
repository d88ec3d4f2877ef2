//! Project handlers.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::{non_blank, parse_id, DataResponse, MessageResponse};
use crate::models::{CreateProject, Project, UpdateProject};
use crate::startup::AppState;
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQuery {
    pub org_id: Option<String>,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
}

impl ProjectQuery {
    fn project_id(&self) -> Result<uuid::Uuid, AppError> {
        let id = non_blank(self.project_id.clone())
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing project ID")))?;
        parse_id(&id, "project ID")
    }
}

/// Body for both create and update.
#[derive(Debug, Deserialize, Validate)]
pub struct ProjectRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub settings: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

/// GET /api/v1/projects?orgId=&userId=
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<DataResponse<Vec<Project>>>, AppError> {
    let (Some(org_id), Some(user_id)) = (non_blank(query.org_id), non_blank(query.user_id)) else {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Missing required parameters"
        )));
    };
    let org_id = parse_id(&org_id, "organization ID")?;

    let projects = state.store.list_projects(org_id, &user_id).await?;
    Ok(Json(DataResponse::new(projects)))
}

/// POST /api/v1/projects?orgId=&userId=
pub async fn create_project(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
    payload: Result<Json<ProjectRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Project>>, AppError> {
    let Json(req) = payload?;

    let org_id = non_blank(query.org_id);
    let user_id = non_blank(query.user_id);
    let name = non_blank(req.name.clone());

    let mut missing = Vec::new();
    if org_id.is_none() {
        missing.push("orgId".to_string());
    }
    if user_id.is_none() {
        missing.push("userId".to_string());
    }
    if name.is_none() {
        missing.push("name".to_string());
    }
    let (Some(org_id), Some(user_id), Some(name)) = (org_id, user_id, name) else {
        return Err(AppError::MissingFields(missing));
    };
    let org_id = parse_id(&org_id, "organization ID")?;
    req.validate()?;

    if state.store.find_organization(org_id).await?.is_none() {
        return Err(AppError::NotFound(anyhow::anyhow!("Organization not found")));
    }

    let project = state
        .store
        .create_project(&CreateProject {
            name,
            description: req.description,
            organization_id: org_id,
            created_by: user_id,
            settings: req.settings.unwrap_or_else(|| serde_json::json!({})),
            is_active: req.is_active.unwrap_or(true),
        })
        .await?;

    tracing::info!(project_id = %project.id, organization_id = %org_id, "Project created");

    Ok(Json(DataResponse::new(project)))
}

/// PUT /api/v1/projects?projectId=
pub async fn update_project(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
    payload: Result<Json<ProjectRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Project>>, AppError> {
    let Json(req) = payload?;
    let id = query.project_id()?;
    req.validate()?;

    let project = state
        .store
        .update_project(
            id,
            &UpdateProject {
                name: non_blank(req.name),
                description: req.description,
                settings: req.settings,
                is_active: req.is_active,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("project not found")))?;

    Ok(Json(DataResponse::new(project)))
}

/// DELETE /api/v1/projects?projectId=
pub async fn delete_project(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = query.project_id()?;

    if !state.store.delete_project(id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("project not found")));
    }

    tracing::info!(project_id = %id, "Project deleted");

    Ok(Json(MessageResponse {
        message: "project deleted successfully".to_string(),
    }))
}
