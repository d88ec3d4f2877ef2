//! Test helper module for tracker-service integration tests.
//!
//! Spawns the service over the in-memory store by default, or over an
//! isolated PostgreSQL schema when `TEST_DATABASE_URL` is available.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use service_core::error::AppError;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use tracker_service::config::{CorsConfig, DatabaseConfig, SessionConfig, TrackerConfig};
use tracker_service::models::{
    CreateOrganization, CreateProject, NewUsageLog, Organization, Project, UpdateOrganization,
    UpdateProject, UsageLog,
};
use uuid::Uuid;
use tracker_service::services::{init_metrics, Database, InMemoryStore, TrackerStore};
use tracker_service::startup::{build_router, AppState, Application};

pub const TEST_USER_ID: &str = "user-123";
pub const SESSION_COOKIE: &str = "next-auth.session-token=test-session";

// Counter for unique schema names
static SCHEMA_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Get the database URL for testing from environment.
pub fn get_test_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

/// Generate a unique schema name for test isolation.
fn unique_schema_name() -> String {
    let counter = SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("test_tracker_{}_{}", std::process::id(), counter)
}

pub fn test_config() -> TrackerConfig {
    TrackerConfig {
        common: CoreConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
        },
        environment: "test".to_string(),
        service_name: "tracker-service-test".to_string(),
        service_version: "0.1.0".to_string(),
        log_level: "warn".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: Secret::new("postgres://unused".to_string()),
            max_connections: 5,
            min_connections: 1,
        },
        session: SessionConfig::default(),
        cors: CorsConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    }
}

/// Router over a fresh in-memory store, for `oneshot` tests.
pub fn test_router(config: TrackerConfig) -> axum::Router {
    init_metrics();
    let store: Arc<dyn TrackerStore> = Arc::new(InMemoryStore::new());
    build_router(AppState::new(config, store))
}

/// In-memory store whose usage-log inserts always fail.
#[derive(Default)]
pub struct FailingStore {
    inner: InMemoryStore,
    pub insert_attempts: AtomicUsize,
}

#[async_trait]
impl TrackerStore for FailingStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.inner.health_check().await
    }

    async fn list_organizations(&self, owner_id: &str) -> Result<Vec<Organization>, AppError> {
        self.inner.list_organizations(owner_id).await
    }

    async fn create_organization(
        &self,
        input: &CreateOrganization,
    ) -> Result<Organization, AppError> {
        self.inner.create_organization(input).await
    }

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, AppError> {
        self.inner.find_organization(id).await
    }

    async fn update_organization(
        &self,
        id: Uuid,
        input: &UpdateOrganization,
    ) -> Result<Option<Organization>, AppError> {
        self.inner.update_organization(id, input).await
    }

    async fn delete_organization(&self, id: Uuid) -> Result<bool, AppError> {
        self.inner.delete_organization(id).await
    }

    async fn list_projects(
        &self,
        organization_id: Uuid,
        created_by: &str,
    ) -> Result<Vec<Project>, AppError> {
        self.inner.list_projects(organization_id, created_by).await
    }

    async fn create_project(&self, input: &CreateProject) -> Result<Project, AppError> {
        self.inner.create_project(input).await
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        self.inner.find_project(id).await
    }

    async fn find_project_by_key(&self, project_key: &str) -> Result<Option<Project>, AppError> {
        self.inner.find_project_by_key(project_key).await
    }

    async fn update_project(
        &self,
        id: Uuid,
        input: &UpdateProject,
    ) -> Result<Option<Project>, AppError> {
        self.inner.update_project(id, input).await
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool, AppError> {
        self.inner.delete_project(id).await
    }

    async fn insert_usage_log(&self, _input: &NewUsageLog) -> Result<UsageLog, AppError> {
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);
        Err(AppError::DatabaseError(anyhow::anyhow!(
            "connection reset by peer"
        )))
    }

    async fn list_usage_logs(
        &self,
        project_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<UsageLog>, AppError> {
        self.inner.list_usage_logs(project_id, since).await
    }
}

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub http_address: String,
    pub http_port: u16,
    pub store: Arc<dyn TrackerStore>,
    /// Client carrying a session cookie.
    pub client: reqwest::Client,
    schema_name: Option<String>,
}

impl TestApp {
    /// Spawn the service over an in-memory store on a random port.
    pub async fn spawn() -> Self {
        let store: Arc<dyn TrackerStore> = Arc::new(InMemoryStore::new());
        Self::spawn_with_store(test_config(), store, None).await
    }

    /// Spawn the service over a caller-provided store.
    pub async fn spawn_with(store: Arc<dyn TrackerStore>) -> Self {
        Self::spawn_with_store(test_config(), store, None).await
    }

    /// Spawn the service over an isolated PostgreSQL schema.
    pub async fn spawn_postgres() -> Self {
        let base_url = get_test_database_url().expect("TEST_DATABASE_URL must be set");
        let schema_name = unique_schema_name();

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&base_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema_name))
            .execute(&pool)
            .await
            .ok();
        sqlx::query(&format!("CREATE SCHEMA {}", schema_name))
            .execute(&pool)
            .await
            .expect("Failed to create test schema");

        pool.close().await;

        // Use ? or & depending on whether URL already has query parameters
        let separator = if base_url.contains('?') { "&" } else { "?" };
        let db_url_with_schema = format!(
            "{}{}options=-c search_path%3D{}",
            base_url, separator, schema_name
        );

        let db = Database::new(&db_url_with_schema, 5, 1)
            .await
            .expect("Failed to create test database");
        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        Self::spawn_with_store(test_config(), Arc::new(db), Some(schema_name)).await
    }

    async fn spawn_with_store(
        config: TrackerConfig,
        store: Arc<dyn TrackerStore>,
        schema_name: Option<String>,
    ) -> Self {
        init_metrics();

        let app = Application::with_store(config, store.clone())
            .await
            .expect("Failed to build test application");

        let http_port = app.http_port();
        let http_address = format!("http://127.0.0.1:{}", http_port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let probe = reqwest::Client::new();
        let health_url = format!("{}/health", http_address);
        for _ in 0..50 {
            if probe.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(SESSION_COOKIE));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        TestApp {
            http_address,
            http_port,
            store,
            client,
            schema_name,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.http_address, path)
    }

    /// Create an organization owned by [`TEST_USER_ID`] and return its JSON.
    pub async fn create_organization(&self, name: &str) -> Value {
        let response = self
            .client
            .post(self.url("/api/v1/organizations"))
            .json(&json!({ "name": name, "owner_id": TEST_USER_ID }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["data"].clone()
    }

    /// Create a project in the organization and return its JSON.
    pub async fn create_project(&self, org_id: &str, name: &str) -> Value {
        let response = self
            .client
            .post(self.url(&format!(
                "/api/v1/projects?orgId={}&userId={}",
                org_id, TEST_USER_ID
            )))
            .json(&json!({ "name": name }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["data"].clone()
    }

    /// Organization plus project; returns the project JSON.
    pub async fn seed_project(&self) -> Value {
        let org = self.create_organization("Acme AI").await;
        let org_id = org["id"].as_str().expect("organization id").to_string();
        self.create_project(&org_id, "Support Bot").await
    }

    /// POST a tracking payload without a session cookie.
    pub async fn track(&self, payload: &Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(self.url("/api/v1/track"))
            .json(payload)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Cleanup test resources (schema).
    pub async fn cleanup(&self) {
        let (Some(schema_name), Some(base_url)) = (&self.schema_name, get_test_database_url())
        else {
            return;
        };

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(&base_url)
            .await
            .ok();

        if let Some(pool) = pool {
            let _ = sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema_name))
                .execute(&pool)
                .await;
            pool.close().await;
        }
    }
}
