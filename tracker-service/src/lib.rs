//! LLM usage tracker: prices reported model calls against a per-provider
//! rate catalog and serves the dashboard API over organizations, projects
//! and usage logs.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pricing;
pub mod services;
pub mod startup;

pub use startup::{build_router, AppState, Application};
