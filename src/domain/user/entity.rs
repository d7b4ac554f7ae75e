//! User entity and related types

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_email, validate_username, UserValidationError};
use crate::domain::storage::StorageEntity;

crate::uuid_identifier!(
    /// User identifier
    UserId,
    "User ID"
);

/// Platform-wide role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Platform administrator
    Admin,
    /// Organization owner
    Owner,
    /// Regular member
    #[default]
    Member,
    /// Read-only access
    Viewer,
}

impl UserRole {
    /// Admins and owners may access any resource regardless of ownership
    pub fn bypasses_ownership(&self) -> bool {
        matches!(self, Self::Admin | Self::Owner)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Owner => "owner",
            Self::Member => "member",
            Self::Viewer => "viewer",
        }
    }
}

impl FromStr for UserRole {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            "member" => Ok(Self::Member),
            "viewer" => Ok(Self::Viewer),
            other => Err(UserValidationError::UnknownRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user
    id: UserId,
    /// Display/login handle
    username: String,
    email: String,
    role: UserRole,
    /// Creation timestamp
    created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        role: UserRole,
    ) -> Result<Self, UserValidationError> {
        let username = username.into();
        let email = email.into();
        validate_username(&username)?;
        validate_email(&email)?;

        Ok(Self {
            id: UserId::generate(),
            username,
            email,
            role,
            created_at: Utc::now(),
        })
    }

    // Getters

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Change the platform role
    pub fn set_role(&mut self, role: UserRole) {
        self.role = role;
    }
}

impl StorageEntity for User {
    type Key = UserId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}
