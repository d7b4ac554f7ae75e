//! Activity log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::storage::StorageEntity;
use crate::domain::user::UserId;

crate::uuid_identifier!(
    /// Activity log entry identifier
    ActivityLogId,
    "Activity log ID"
);

/// Kind of entity an activity refers to
///
/// Open-ended: the HTTP hook derives it from the request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
    pub const API: &'static str = "api";
    pub const API_KEY: &'static str = "api_key";
    pub const CREDENTIAL: &'static str = "credential";
    pub const PROJECT: &'static str = "project";
    pub const ASSET: &'static str = "asset";
    pub const TEAM: &'static str = "team";
    pub const USER: &'static str = "user";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityAction(String);

impl ActivityAction {
    pub const CREATE: &'static str = "create";
    pub const READ: &'static str = "read";
    pub const UPDATE: &'static str = "update";
    pub const DELETE: &'static str = "delete";
    pub const LOGIN: &'static str = "login";
    pub const LOGOUT: &'static str = "logout";
    pub const UPLOAD: &'static str = "upload";
    pub const DOWNLOAD: &'static str = "download";
    pub const INVITE: &'static str = "invite";
    pub const JOIN: &'static str = "join";
    pub const LEAVE: &'static str = "leave";
    pub const SHARE: &'static str = "share";
    pub const REVOKE: &'static str = "revoke";
    pub const ADMIN_ACTION: &'static str = "admin_action";
    pub const SETTINGS_CHANGE: &'static str = "settings_change";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Map an HTTP method to the matching CRUD action
    pub fn from_http_method(method: &str) -> Option<Self> {
        let action = match method.to_ascii_uppercase().as_str() {
            "GET" => Self::READ,
            "POST" => Self::CREATE,
            "PUT" | "PATCH" => Self::UPDATE,
            "DELETE" => Self::DELETE,
            _ => return None,
        };
        Some(Self::new(action))
    }

    pub fn is_read(&self) -> bool {
        self.0 == Self::READ
    }
}

impl From<&str> for ActivityAction {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client information captured from the originating request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// One append-only audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: ActivityLogId,
    pub user_id: Option<UserId>,
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    pub action: ActivityAction,
    #[serde(default)]
    pub details: Map<String, Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ActivityLogEntry {
    pub fn new(
        user_id: Option<UserId>,
        entity_type: EntityType,
        entity_id: Option<String>,
        action: ActivityAction,
        details: Map<String, Value>,
        context: RequestContext,
    ) -> Self {
        Self {
            id: ActivityLogId::generate(),
            user_id,
            entity_type,
            entity_id,
            action,
            details,
            ip_address: context.ip_address,
            user_agent: context.user_agent,
            created_at: Utc::now(),
        }
    }
}

impl StorageEntity for ActivityLogEntry {
    type Key = ActivityLogId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_from_http_method() {
        assert_eq!(ActivityAction::from_http_method("GET").unwrap().as_str(), "read");
        assert_eq!(ActivityAction::from_http_method("post").unwrap().as_str(), "create");
        assert_eq!(ActivityAction::from_http_method("PUT").unwrap().as_str(), "update");
        assert_eq!(ActivityAction::from_http_method("PATCH").unwrap().as_str(), "update");
        assert_eq!(ActivityAction::from_http_method("DELETE").unwrap().as_str(), "delete");
        assert!(ActivityAction::from_http_method("OPTIONS").is_none());
    }

    #[test]
    fn test_entry_serializes_open_strings() {
        let entry = ActivityLogEntry::new(
            None,
            EntityType::new("voice_profile"),
            Some("abc".to_string()),
            ActivityAction::new(ActivityAction::SHARE),
            Map::new(),
            RequestContext {
                ip_address: Some("10.0.0.1".to_string()),
                user_agent: None,
            },
        );

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["entity_type"], "voice_profile");
        assert_eq!(value["action"], "share");
        assert_eq!(value["ip_address"], "10.0.0.1");
        assert!(value["user_id"].is_null());
    }
}
