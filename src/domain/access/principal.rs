//! Authenticated caller identity

use serde::Serialize;

use crate::domain::api_key::ApiKeyId;
use crate::domain::user::{UserId, UserRole};

/// The user on whose behalf a request runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: UserRole,
    /// Key the request authenticated with, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_id: Option<ApiKeyId>,
}

impl Principal {
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self {
            user_id,
            role,
            api_key_id: None,
        }
    }

    pub fn with_api_key(mut self, api_key_id: ApiKeyId) -> Self {
        self.api_key_id = Some(api_key_id);
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Admin and owner roles skip per-resource ownership checks
    pub fn bypasses_ownership(&self) -> bool {
        self.role.bypasses_ownership()
    }
}
