//! Persistence seam for organizations, projects and usage logs.

use crate::models::{
    CreateOrganization, CreateProject, NewUsageLog, Organization, Project, UpdateOrganization,
    UpdateProject, UsageLog,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use uuid::Uuid;

/// Storage backend used by the HTTP handlers.
///
/// Update and delete methods return `Ok(None)` / `Ok(false)` when the row
/// does not exist so handlers can answer 404 without a separate lookup race.
#[async_trait]
pub trait TrackerStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    // Organizations
    async fn list_organizations(&self, owner_id: &str) -> Result<Vec<Organization>, AppError>;
    async fn create_organization(
        &self,
        input: &CreateOrganization,
    ) -> Result<Organization, AppError>;
    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, AppError>;
    async fn update_organization(
        &self,
        id: Uuid,
        input: &UpdateOrganization,
    ) -> Result<Option<Organization>, AppError>;
    /// Deletes the organization together with its projects.
    async fn delete_organization(&self, id: Uuid) -> Result<bool, AppError>;

    // Projects
    async fn list_projects(
        &self,
        organization_id: Uuid,
        created_by: &str,
    ) -> Result<Vec<Project>, AppError>;
    async fn create_project(&self, input: &CreateProject) -> Result<Project, AppError>;
    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, AppError>;
    async fn find_project_by_key(&self, project_key: &str) -> Result<Option<Project>, AppError>;
    async fn update_project(
        &self,
        id: Uuid,
        input: &UpdateProject,
    ) -> Result<Option<Project>, AppError>;
    async fn delete_project(&self, id: Uuid) -> Result<bool, AppError>;

    // Usage
    async fn insert_usage_log(&self, input: &NewUsageLog) -> Result<UsageLog, AppError>;
    /// Logs for a project, newest first, optionally bounded below by `since`.
    async fn list_usage_logs(
        &self,
        project_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<UsageLog>, AppError>;
}
