//! Application startup and lifecycle management.

use crate::config::TrackerConfig;
use crate::handlers;
use crate::middleware::{error_observer_middleware, session_middleware};
use crate::pricing::RateTable;
use crate::services::{init_metrics, Database, TrackerStore};
use axum::{
    http::{header, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::security_headers::security_headers_middleware;
use service_core::middleware::tracing::{request_id_middleware, REQUEST_ID_HEADER};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: TrackerConfig,
    pub store: Arc<dyn TrackerStore>,
    pub rates: Arc<RateTable>,
}

impl AppState {
    /// State priced against the built-in rate catalog.
    pub fn new(config: TrackerConfig, store: Arc<dyn TrackerStore>) -> Self {
        Self {
            config,
            store,
            rates: Arc::new(RateTable::builtin()),
        }
    }
}

fn cors_layer(config: &TrackerConfig) -> CorsLayer {
    let origins = &config.cors.allowed_origins;
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| {
            o.parse::<HeaderValue>()
                .inspect_err(|e| tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

/// Build the HTTP router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api", get(handlers::hello))
        .route("/api/v1/track", post(handlers::track_usage))
        .route(
            "/api/v1/organizations",
            get(handlers::list_organizations)
                .post(handlers::create_organization)
                .put(handlers::update_organization)
                .delete(handlers::delete_organization),
        )
        .route(
            "/api/v1/projects",
            get(handlers::list_projects)
                .post(handlers::create_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route("/api/v1/usage", get(handlers::list_usage))
        .route("/api/v1/usage/summary", get(handlers::usage_summary))
        .layer(from_fn(error_observer_middleware))
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Connect to PostgreSQL, apply migrations and bind the listener.
    pub async fn build(config: TrackerConfig) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        db.run_migrations().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            e
        })?;

        Self::with_store(config, Arc::new(db)).await
    }

    /// Build the application around an existing store.
    pub async fn with_store(
        config: TrackerConfig,
        store: Arc<dyn TrackerStore>,
    ) -> Result<Self, AppError> {
        init_metrics();

        let addr = config.common.bind_address();
        let http_listener = TcpListener::bind(&addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        let state = AppState::new(config, store);

        tracing::info!(
            http_port = http_port,
            rate_entries = state.rates.len(),
            "Tracker service listener bound"
        );

        Ok(Self {
            http_port,
            http_listener,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let service_name = self.state.config.service_name.clone();
        let router = build_router(self.state);

        tracing::info!(
            service = %service_name,
            version = env!("CARGO_PKG_VERSION"),
            http_port = self.http_port,
            "Service ready to accept connections"
        );

        axum::serve(self.http_listener, router).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
