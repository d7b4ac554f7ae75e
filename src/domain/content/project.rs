//! Project entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::storage::{OwnedEntity, StorageEntity};
use crate::domain::user::UserId;
use crate::domain::DomainError;

crate::uuid_identifier!(
    /// Project identifier
    ProjectId,
    "Project ID"
);

const MAX_PROJECT_NAME_LENGTH: usize = 120;
const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Lifecycle status of a game project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Archived,
}

/// A game project; the root of most content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    owner_id: UserId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    genre: Option<String>,
    #[serde(default)]
    status: ProjectStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(owner_id: UserId, name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(DomainError::validation("Project name cannot be empty"));
        }

        if name.len() > MAX_PROJECT_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Project name cannot exceed {} characters",
                MAX_PROJECT_NAME_LENGTH
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id: ProjectId::generate(),
            owner_id,
            name,
            description: None,
            genre: None,
            status: ProjectStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_description(mut self, description: Option<String>) -> Result<Self, DomainError> {
        if description
            .as_ref()
            .is_some_and(|d| d.len() > MAX_DESCRIPTION_LENGTH)
        {
            return Err(DomainError::validation(format!(
                "Project description cannot exceed {} characters",
                MAX_DESCRIPTION_LENGTH
            )));
        }

        self.description = description;
        Ok(self)
    }

    pub fn with_genre(mut self, genre: Option<String>) -> Self {
        self.genre = genre;
        self
    }

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn owner(&self) -> &UserId {
        &self.owner_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn genre(&self) -> Option<&str> {
        self.genre.as_deref()
    }

    pub fn status(&self) -> ProjectStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl StorageEntity for Project {
    type Key = ProjectId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl OwnedEntity for Project {
    const RESOURCE_NAME: &'static str = "Project";

    fn owner_id(&self) -> &str {
        self.owner_id.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_creation() {
        let owner = UserId::generate();
        let project = Project::new(owner.clone(), "Skyfall")
            .unwrap()
            .with_description(Some("Open world RPG".to_string()))
            .unwrap()
            .with_genre(Some("rpg".to_string()));

        assert_eq!(project.name(), "Skyfall");
        assert_eq!(project.owner_id(), owner.as_str());
        assert_eq!(project.genre(), Some("rpg"));
        assert_eq!(project.status(), ProjectStatus::Active);
    }

    #[test]
    fn test_project_validation() {
        assert!(Project::new(UserId::generate(), "").is_err());
        assert!(Project::new(UserId::generate(), "x".repeat(121)).is_err());

        let project = Project::new(UserId::generate(), "Skyfall").unwrap();
        assert!(project.with_description(Some("d".repeat(2001))).is_err());
    }
}
