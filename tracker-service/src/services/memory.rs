//! In-process store for tests and local runs without PostgreSQL.

use crate::models::{
    CreateOrganization, CreateProject, NewUsageLog, Organization, Project, UpdateOrganization,
    UpdateProject, UsageLog,
};
use crate::services::store::TrackerStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    organizations: HashMap<Uuid, Organization>,
    projects: HashMap<Uuid, Project>,
    usage_logs: Vec<UsageLog>,
}

/// Mirrors the PostgreSQL schema's cascade rules: deleting an organization
/// removes its projects, deleting a project removes its usage logs.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
}

#[async_trait]
impl TrackerStore for InMemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_organizations(&self, owner_id: &str) -> Result<Vec<Organization>, AppError> {
        let tables = self.tables.read().await;
        let mut orgs: Vec<Organization> = tables
            .organizations
            .values()
            .filter(|org| org.owner_id == owner_id)
            .cloned()
            .collect();
        orgs.sort_by_key(|org| org.created_at);
        Ok(orgs)
    }

    async fn create_organization(
        &self,
        input: &CreateOrganization,
    ) -> Result<Organization, AppError> {
        let org = Organization::new(input);
        self.tables.write().await.organizations.insert(org.id, org.clone());
        Ok(org)
    }

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, AppError> {
        Ok(self.tables.read().await.organizations.get(&id).cloned())
    }

    async fn update_organization(
        &self,
        id: Uuid,
        input: &UpdateOrganization,
    ) -> Result<Option<Organization>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.organizations.get_mut(&id).map(|org| {
            org.apply(input);
            org.clone()
        }))
    }

    async fn delete_organization(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.organizations.remove(&id).is_none() {
            return Ok(false);
        }

        let removed: Vec<Uuid> = tables
            .projects
            .values()
            .filter(|project| project.organization_id == id)
            .map(|project| project.id)
            .collect();
        for project_id in &removed {
            tables.projects.remove(project_id);
        }
        tables
            .usage_logs
            .retain(|log| !removed.contains(&log.project_id));

        Ok(true)
    }

    async fn list_projects(
        &self,
        organization_id: Uuid,
        created_by: &str,
    ) -> Result<Vec<Project>, AppError> {
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables
            .projects
            .values()
            .filter(|p| p.organization_id == organization_id && p.created_by == created_by)
            .cloned()
            .collect();
        newest_first(&mut projects, |p| p.created_at);
        Ok(projects)
    }

    async fn create_project(&self, input: &CreateProject) -> Result<Project, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.organizations.contains_key(&input.organization_id) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "Failed to create project: organization {} does not exist",
                input.organization_id
            )));
        }
        let project = Project::new(input);
        tables.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        Ok(self.tables.read().await.projects.get(&id).cloned())
    }

    async fn find_project_by_key(&self, project_key: &str) -> Result<Option<Project>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .projects
            .values()
            .find(|p| p.project_key == project_key)
            .cloned())
    }

    async fn update_project(
        &self,
        id: Uuid,
        input: &UpdateProject,
    ) -> Result<Option<Project>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.projects.get_mut(&id).map(|project| {
            project.apply(input);
            project.clone()
        }))
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.projects.remove(&id).is_none() {
            return Ok(false);
        }
        tables.usage_logs.retain(|log| log.project_id != id);
        Ok(true)
    }

    async fn insert_usage_log(&self, input: &NewUsageLog) -> Result<UsageLog, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.projects.contains_key(&input.project_id) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "Failed to insert usage log: project {} does not exist",
                input.project_id
            )));
        }
        let log = UsageLog::new(input);
        tables.usage_logs.push(log.clone());
        Ok(log)
    }

    async fn list_usage_logs(
        &self,
        project_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<UsageLog>, AppError> {
        let tables = self.tables.read().await;
        let mut logs: Vec<UsageLog> = tables
            .usage_logs
            .iter()
            .filter(|log| log.project_id == project_id)
            .filter(|log| since.map_or(true, |cutoff| log.timestamp >= cutoff))
            .cloned()
            .collect();
        newest_first(&mut logs, |log| log.timestamp);
        Ok(logs)
    }
}
