//! PostgreSQL store for tracker-service.

use crate::models::{
    CreateOrganization, CreateProject, NewUsageLog, Organization, Project, UpdateOrganization,
    UpdateProject, UsageLog,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::TrackerStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const ORGANIZATION_COLUMNS: &str =
    "id, name, description, owner_id, is_active, settings, created_at, updated_at";

const PROJECT_COLUMNS: &str = "id, name, description, project_key, organization_id, created_by, is_active, settings, created_at, updated_at";

const USAGE_LOG_COLUMNS: &str = "id, project_id, project_key, timestamp, model, provider, prompt_tokens, completion_tokens, total_tokens, input_cost, output_cost, total_cost, currency, request_duration_ms, status_code, error_message";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "tracker-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl TrackerStore for Database {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    // =========================================================================
    // Organization Operations
    // =========================================================================

    #[instrument(skip(self))]
    async fn list_organizations(&self, owner_id: &str) -> Result<Vec<Organization>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_organizations"])
            .start_timer();

        let orgs = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE owner_id = $1 ORDER BY created_at ASC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list organizations: {}", e))
        })?;

        timer.observe_duration();

        Ok(orgs)
    }

    #[instrument(skip(self, input), fields(owner_id = %input.owner_id))]
    async fn create_organization(
        &self,
        input: &CreateOrganization,
    ) -> Result<Organization, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_organization"])
            .start_timer();

        let org = sqlx::query_as::<_, Organization>(&format!(
            r#"
            INSERT INTO organizations (id, name, description, owner_id, settings)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORGANIZATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.owner_id)
        .bind(&input.settings)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create organization: {}", e))
        })?;

        timer.observe_duration();

        info!(organization_id = %org.id, "Organization created");

        Ok(org)
    }

    #[instrument(skip(self), fields(organization_id = %id))]
    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_organization"])
            .start_timer();

        let org = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get organization: {}", e)))?;

        timer.observe_duration();

        Ok(org)
    }

    #[instrument(skip(self, input), fields(organization_id = %id))]
    async fn update_organization(
        &self,
        id: Uuid,
        input: &UpdateOrganization,
    ) -> Result<Option<Organization>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_organization"])
            .start_timer();

        let org = sqlx::query_as::<_, Organization>(&format!(
            r#"
            UPDATE organizations
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                settings = COALESCE($4, settings),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ORGANIZATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.settings)
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update organization: {}", e))
        })?;

        timer.observe_duration();

        Ok(org)
    }

    #[instrument(skip(self), fields(organization_id = %id))]
    async fn delete_organization(&self, id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_organization"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        // Usage logs follow their projects via ON DELETE CASCADE.
        sqlx::query("DELETE FROM projects WHERE organization_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to delete organization projects: {}",
                    e
                ))
            })?;

        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete organization: {}", e))
            })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Project Operations
    // =========================================================================

    #[instrument(skip(self), fields(organization_id = %organization_id))]
    async fn list_projects(
        &self,
        organization_id: Uuid,
        created_by: &str,
    ) -> Result<Vec<Project>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_projects"])
            .start_timer();

        let projects = sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS} FROM projects
            WHERE organization_id = $1 AND created_by = $2
            ORDER BY created_at DESC
            "#
        ))
        .bind(organization_id)
        .bind(created_by)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list projects: {}", e)))?;

        timer.observe_duration();

        Ok(projects)
    }

    #[instrument(skip(self, input), fields(organization_id = %input.organization_id))]
    async fn create_project(&self, input: &CreateProject) -> Result<Project, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_project"])
            .start_timer();

        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (id, name, description, project_key, organization_id, created_by, is_active, settings)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.description)
        .bind(Project::generate_key())
        .bind(input.organization_id)
        .bind(&input.created_by)
        .bind(input.is_active)
        .bind(&input.settings)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create project: {}", e)))?;

        timer.observe_duration();

        info!(project_id = %project.id, "Project created");

        Ok(project)
    }

    #[instrument(skip(self), fields(project_id = %id))]
    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_project"])
            .start_timer();

        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get project: {}", e)))?;

        timer.observe_duration();

        Ok(project)
    }

    #[instrument(skip(self, project_key))]
    async fn find_project_by_key(&self, project_key: &str) -> Result<Option<Project>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_project_by_key"])
            .start_timer();

        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE project_key = $1"
        ))
        .bind(project_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get project by key: {}", e))
        })?;

        timer.observe_duration();

        Ok(project)
    }

    #[instrument(skip(self, input), fields(project_id = %id))]
    async fn update_project(
        &self,
        id: Uuid,
        input: &UpdateProject,
    ) -> Result<Option<Project>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_project"])
            .start_timer();

        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                settings = COALESCE($4, settings),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.settings)
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update project: {}", e)))?;

        timer.observe_duration();

        Ok(project)
    }

    #[instrument(skip(self), fields(project_id = %id))]
    async fn delete_project(&self, id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_project"])
            .start_timer();

        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete project: {}", e)))?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Usage Operations
    // =========================================================================

    #[instrument(skip(self, input), fields(project_id = %input.project_id, model = %input.record.model))]
    async fn insert_usage_log(&self, input: &NewUsageLog) -> Result<UsageLog, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_usage_log"])
            .start_timer();

        let row = UsageLog::new(input);
        let log = sqlx::query_as::<_, UsageLog>(&format!(
            r#"
            INSERT INTO usage_logs (id, project_id, project_key, timestamp, model, provider, prompt_tokens, completion_tokens, total_tokens, input_cost, output_cost, total_cost, currency, request_duration_ms, status_code, error_message)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {USAGE_LOG_COLUMNS}
            "#
        ))
        .bind(row.id)
        .bind(row.project_id)
        .bind(&row.project_key)
        .bind(row.timestamp)
        .bind(&row.model)
        .bind(&row.provider)
        .bind(row.prompt_tokens)
        .bind(row.completion_tokens)
        .bind(row.total_tokens)
        .bind(row.input_cost)
        .bind(row.output_cost)
        .bind(row.total_cost)
        .bind(&row.currency)
        .bind(row.request_duration_ms)
        .bind(row.status_code)
        .bind(&row.error_message)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert usage log: {}", e)))?;

        timer.observe_duration();

        Ok(log)
    }

    #[instrument(skip(self), fields(project_id = %project_id))]
    async fn list_usage_logs(
        &self,
        project_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<UsageLog>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_usage_logs"])
            .start_timer();

        let logs = sqlx::query_as::<_, UsageLog>(&format!(
            r#"
            SELECT {USAGE_LOG_COLUMNS} FROM usage_logs
            WHERE project_id = $1 AND ($2::timestamptz IS NULL OR timestamp >= $2)
            ORDER BY timestamp DESC
            "#
        ))
        .bind(project_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list usage logs: {}", e)))?;

        timer.observe_duration();

        Ok(logs)
    }
}
