//! Organization handlers.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::{non_blank, parse_id, DataResponse, MessageResponse};
use crate::models::{CreateOrganization, Organization, UpdateOrganization};
use crate::startup::AppState;
use service_core::error::AppError;

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationQuery {
    pub user_id: Option<String>,
    pub org_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner_id: Option<String>,
    pub settings: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrganizationRequest {
    pub id: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub settings: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/organizations?userId=
pub async fn list_organizations(
    State(state): State<AppState>,
    Query(query): Query<OrganizationQuery>,
) -> Result<Json<DataResponse<Vec<Organization>>>, AppError> {
    let user_id = non_blank(query.user_id)
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing user ID parameter")))?;

    let orgs = state.store.list_organizations(&user_id).await?;
    Ok(Json(DataResponse::new(orgs)))
}

/// POST /api/v1/organizations
pub async fn create_organization(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrganizationRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Organization>>, AppError> {
    let Json(req) = payload?;

    let mut missing = Vec::new();
    let name = non_blank(req.name.clone());
    let owner_id = non_blank(req.owner_id.clone());
    if name.is_none() {
        missing.push("name".to_string());
    }
    if owner_id.is_none() {
        missing.push("owner_id".to_string());
    }
    let (Some(name), Some(owner_id)) = (name, owner_id) else {
        return Err(AppError::MissingFields(missing));
    };
    req.validate()?;

    let org = state
        .store
        .create_organization(&CreateOrganization {
            name,
            description: req.description,
            owner_id,
            settings: req.settings.unwrap_or_else(|| serde_json::json!({})),
        })
        .await?;

    tracing::info!(organization_id = %org.id, "Organization created");

    Ok(Json(DataResponse::new(org)))
}

/// PUT /api/v1/organizations
pub async fn update_organization(
    State(state): State<AppState>,
    payload: Result<Json<UpdateOrganizationRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Organization>>, AppError> {
    let Json(req) = payload?;

    let id = non_blank(req.id.clone())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing organization ID")))?;
    let id = parse_id(&id, "organization ID")?;
    req.validate()?;

    let org = state
        .store
        .update_organization(
            id,
            &UpdateOrganization {
                name: req.name,
                description: req.description,
                settings: req.settings,
                is_active: req.is_active,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Organization not found")))?;

    Ok(Json(DataResponse::new(org)))
}

/// DELETE /api/v1/organizations?orgId=
pub async fn delete_organization(
    State(state): State<AppState>,
    Query(query): Query<OrganizationQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = non_blank(query.org_id)
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing organization ID")))?;
    let id = parse_id(&id, "organization ID")?;

    if !state.store.delete_organization(id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Organization not found")));
    }

    tracing::info!(organization_id = %id, "Organization deleted");

    Ok(Json(MessageResponse {
        message: "Organization and associated projects deleted successfully".to_string(),
    }))
}
