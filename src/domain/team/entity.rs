//! Team entity and related types

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_team_name, TeamValidationError};
use crate::domain::storage::StorageEntity;
use crate::domain::user::UserId;

crate::uuid_identifier!(
    /// Team identifier
    TeamId,
    "Team ID"
);

crate::uuid_identifier!(
    /// Team membership identifier
    MembershipId,
    "Membership ID"
);

/// Role of a user within a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    /// Team owner - full control including team deletion
    Owner,
    /// Team admin - can manage members and resources
    Admin,
    /// Regular team member
    #[default]
    Member,
}

impl TeamRole {
    /// Check if this role can manage team members
    pub fn can_manage_members(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl FromStr for TeamRole {
    type Err = TeamValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(TeamValidationError::UnknownRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Team entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Unique identifier
    id: TeamId,
    /// Display name
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    /// User that created the team
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Team {
    /// Create a new team
    pub fn new(name: impl Into<String>, created_by: UserId) -> Result<Self, TeamValidationError> {
        let name = name.into();
        validate_team_name(&name)?;
        let now = Utc::now();

        Ok(Self {
            id: TeamId::generate(),
            name,
            description: None,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Set description (builder pattern)
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    // Getters

    pub fn id(&self) -> &TeamId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl StorageEntity for Team {
    type Key = TeamId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

/// A user's membership in a team
///
/// At most one membership exists per (team, user) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMembership {
    id: MembershipId,
    team_id: TeamId,
    user_id: UserId,
    role: TeamRole,
    joined_at: DateTime<Utc>,
}

impl TeamMembership {
    pub fn new(team_id: TeamId, user_id: UserId, role: TeamRole) -> Self {
        Self {
            id: MembershipId::generate(),
            team_id,
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &MembershipId {
        &self.id
    }

    pub fn team_id(&self) -> &TeamId {
        &self.team_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn role(&self) -> TeamRole {
        self.role
    }

    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }
}

impl StorageEntity for TeamMembership {
    type Key = MembershipId;

    const TIMESTAMP_FIELDS: &'static [&'static str] = &["joined_at"];

    fn key(&self) -> &Self::Key {
        &self.id
    }
}
