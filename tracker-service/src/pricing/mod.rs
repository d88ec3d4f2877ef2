//! Model rate resolution and usage cost computation.
//!
//! Everything here is pure: a [`RateTable`] is built once at startup and
//! shared read-only, and every lookup or cost computation is a function of
//! its inputs alone.

mod cost;
mod error;
mod provider;
mod table;

pub use cost::{compute_cost, CostBreakdown};
pub use error::PricingError;
pub use provider::Provider;
pub use table::{ModelRate, RateTable, RateTableBuilder};
