//! Domain models for tracker-service.

mod organization;
mod project;
mod summary;
mod usage;

pub use organization::{CreateOrganization, Organization, UpdateOrganization};
pub use project::{CreateProject, Project, UpdateProject};
pub use summary::{
    DailyUsage, ModelUsage, PeriodChange, PeriodTotals, ProviderUsage, TimeRange, UsageSummary,
};
pub use usage::{NewUsageLog, UsageLog, UsageRecord, DEFAULT_CURRENCY};
