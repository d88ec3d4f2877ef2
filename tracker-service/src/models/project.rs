//! Project model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A tracked application inside an organization. Its `project_key` is the
/// `api_key` clients send to the tracking endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub project_key: String,
    pub organization_id: Uuid,
    pub created_by: String,
    pub is_active: bool,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub organization_id: Uuid,
    pub created_by: String,
    pub settings: serde_json::Value,
    pub is_active: bool,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub settings: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

impl Project {
    pub fn new(input: &CreateProject) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            description: input.description.clone(),
            project_key: Self::generate_key(),
            organization_id: input.organization_id,
            created_by: input.created_by.clone(),
            is_active: input.is_active,
            settings: input.settings.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Fresh tracking key, `pk_` followed by 32 hex characters.
    pub fn generate_key() -> String {
        format!("pk_{}", Uuid::new_v4().simple())
    }

    /// Apply a partial update in place and bump `updated_at`.
    pub fn apply(&mut self, update: &UpdateProject) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        if let Some(settings) = &update.settings {
            self.settings = settings.clone();
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_are_unique_and_prefixed() {
        let a = Project::generate_key();
        let b = Project::generate_key();
        assert_ne!(a, b);
        assert!(a.starts_with("pk_"));
        assert_eq!(a.len(), 35);
    }
}
