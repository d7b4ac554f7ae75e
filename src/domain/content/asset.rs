//! Generated asset entity (3D models, audio, images, voice lines)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::project::ProjectId;
use crate::domain::storage::{OwnedEntity, StorageEntity};
use crate::domain::user::UserId;
use crate::domain::DomainError;

crate::uuid_identifier!(
    /// Asset identifier
    AssetId,
    "Asset ID"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Model3d,
    Audio,
    Image,
    Voice,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    id: AssetId,
    owner_id: UserId,
    project_id: ProjectId,
    name: String,
    kind: AssetKind,
    /// Object storage location; the bytes themselves live elsewhere
    storage_url: String,
    created_at: DateTime<Utc>,
}

impl Asset {
    pub fn new(
        owner_id: UserId,
        project_id: ProjectId,
        name: impl Into<String>,
        kind: AssetKind,
        storage_url: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("Asset name cannot be empty"));
        }

        Ok(Self {
            id: AssetId::generate(),
            owner_id,
            project_id,
            name,
            kind,
            storage_url: storage_url.into(),
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> &AssetId {
        &self.id
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn storage_url(&self) -> &str {
        &self.storage_url
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl StorageEntity for Asset {
    type Key = AssetId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl OwnedEntity for Asset {
    const RESOURCE_NAME: &'static str = "Asset";

    fn owner_id(&self) -> &str {
        self.owner_id.as_str()
    }
}
