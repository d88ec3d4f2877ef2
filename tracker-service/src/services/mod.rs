//! Services module for tracker-service.

pub mod database;
pub mod memory;
pub mod metrics;
pub mod store;
pub mod tracking;

pub use database::Database;
pub use memory::InMemoryStore;
pub use metrics::{
    get_metrics, init_metrics, record_error, record_tracked_request, record_usage_cost,
    record_usage_tokens,
};
pub use store::TrackerStore;
pub use tracking::{price_usage, TrackUsage};
