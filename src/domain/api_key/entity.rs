//! API Key entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::ApiKeyValidationError;
use crate::domain::storage::StorageEntity;
use crate::domain::team::TeamId;
use crate::domain::user::UserId;

crate::uuid_identifier!(
    /// API key identifier
    ApiKeyId,
    "API key ID"
);

/// The principal an API key belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ApiKeyOwner {
    User(UserId),
    Team(TeamId),
}

impl ApiKeyOwner {
    /// Name of the persisted field that holds this owner's ID
    pub fn field(&self) -> &'static str {
        match self {
            Self::User(_) => "user_id",
            Self::Team(_) => "team_id",
        }
    }

    pub fn id_str(&self) -> &str {
        match self {
            Self::User(id) => id.as_str(),
            Self::Team(id) => id.as_str(),
        }
    }
}

/// API Key entity
///
/// Only the SHA-256 hash of the raw key is stored. The owner is persisted as
/// two optional columns, exactly one of which is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ApiKeyRecord")]
pub struct ApiKey {
    id: ApiKeyId,
    name: String,
    user_id: Option<UserId>,
    team_id: Option<TeamId>,
    /// Lowercase hex SHA-256 of the full raw key
    key_hash: String,
    /// Non-secret lookup prefix, e.g. `fk_live_AbCdEfGh`
    key_prefix: String,
    permissions: Vec<String>,
    /// User that created the key
    created_by: UserId,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    last_used_at: Option<DateTime<Utc>>,
    revoked_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Raw persisted shape, checked before becoming an `ApiKey`
#[derive(Deserialize)]
struct ApiKeyRecord {
    id: ApiKeyId,
    name: String,
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    team_id: Option<TeamId>,
    key_hash: String,
    key_prefix: String,
    #[serde(default)]
    permissions: Vec<String>,
    created_by: UserId,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    #[serde(default)]
    last_used_at: Option<DateTime<Utc>>,
    #[serde(default)]
    revoked_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApiKeyRecord> for ApiKey {
    type Error = ApiKeyValidationError;

    fn try_from(r: ApiKeyRecord) -> Result<Self, Self::Error> {
        if r.user_id.is_some() == r.team_id.is_some() {
            return Err(ApiKeyValidationError::InvalidOwner);
        }

        Ok(Self {
            id: r.id,
            name: r.name,
            user_id: r.user_id,
            team_id: r.team_id,
            key_hash: r.key_hash,
            key_prefix: r.key_prefix,
            permissions: r.permissions,
            created_by: r.created_by,
            expires_at: r.expires_at,
            is_active: r.is_active,
            last_used_at: r.last_used_at,
            revoked_at: r.revoked_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

impl ApiKey {
    /// Create a new active API key
    pub fn new(
        name: impl Into<String>,
        owner: ApiKeyOwner,
        key_hash: impl Into<String>,
        key_prefix: impl Into<String>,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();
        let (user_id, team_id) = match owner {
            ApiKeyOwner::User(id) => (Some(id), None),
            ApiKeyOwner::Team(id) => (None, Some(id)),
        };

        Self {
            id: ApiKeyId::generate(),
            name: name.into(),
            user_id,
            team_id,
            key_hash: key_hash.into(),
            key_prefix: key_prefix.into(),
            permissions: Vec::new(),
            created_by,
            expires_at: None,
            is_active: true,
            last_used_at: None,
            revoked_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set permissions
    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    /// Set expiration
    pub fn with_expiration(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    // Getters

    pub fn id(&self) -> &ApiKeyId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> ApiKeyOwner {
        match (&self.user_id, &self.team_id) {
            (_, Some(team_id)) => ApiKeyOwner::Team(team_id.clone()),
            (Some(user_id), None) => ApiKeyOwner::User(user_id.clone()),
            // Unreachable: construction and deserialization both enforce an owner
            (None, None) => ApiKeyOwner::User(self.created_by.clone()),
        }
    }

    pub fn key_hash(&self) -> &str {
        &self.key_hash
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    pub fn revoked_at(&self) -> Option<DateTime<Utc>> {
        self.revoked_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Status checks

    /// Active, not revoked and not past its expiration
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.revoked_at.is_none()
            && self.expires_at.is_none_or(|expires_at| now < expires_at)
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    // Mutators

    /// Replace the secret after rotation
    pub fn rotate(&mut self, key_hash: impl Into<String>, key_prefix: impl Into<String>) {
        self.key_hash = key_hash.into();
        self.key_prefix = key_prefix.into();
        self.touch();
    }

    /// Soft-revoke the key
    pub fn revoke(&mut self) {
        self.is_active = false;
        if self.revoked_at.is_none() {
            self.revoked_at = Some(Utc::now());
        }
        self.touch();
    }

    /// Record key usage
    pub fn record_usage(&mut self) {
        self.last_used_at = Some(Utc::now());
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl StorageEntity for ApiKey {
    type Key = ApiKeyId;

    const TIMESTAMP_FIELDS: &'static [&'static str] = &[
        "created_at",
        "updated_at",
        "last_used_at",
        "expires_at",
        "revoked_at",
    ];

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

/// Client-facing view of an API key; never carries the hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeySummary {
    pub id: String,
    pub name: String,
    pub owner: ApiKeyOwner,
    pub key_prefix: String,
    pub permissions: Vec<String>,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ApiKey> for ApiKeySummary {
    fn from(key: &ApiKey) -> Self {
        Self {
            id: key.id.to_string(),
            name: key.name.clone(),
            owner: key.owner(),
            key_prefix: key.key_prefix.clone(),
            permissions: key.permissions.clone(),
            created_by: key.created_by.to_string(),
            expires_at: key.expires_at,
            is_active: key.is_active,
            last_used_at: key.last_used_at,
            revoked_at: key.revoked_at,
            created_at: key.created_at,
            updated_at: key.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_api_key(owner: ApiKeyOwner) -> ApiKey {
        ApiKey::new(
            "Build server",
            owner,
            "ab".repeat(32),
            "fk_live_AbCdEfGh",
            UserId::generate(),
        )
    }

    #[test]
    fn test_user_owned_key_persists_user_column() {
        let user_id = UserId::generate();
        let key = create_test_api_key(ApiKeyOwner::User(user_id.clone()));

        let value = serde_json::to_value(&key).unwrap();
        assert_eq!(value["user_id"], user_id.as_str());
        assert!(value["team_id"].is_null());
        assert_eq!(key.owner(), ApiKeyOwner::User(user_id));
    }

    #[test]
    fn test_team_owned_key_round_trips() {
        let team_id = TeamId::generate();
        let key = create_test_api_key(ApiKeyOwner::Team(team_id.clone()));

        let json = serde_json::to_string(&key).unwrap();
        let restored: ApiKey = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.owner(), ApiKeyOwner::Team(team_id));
    }

    #[test]
    fn test_record_with_two_owners_rejected() {
        let key = create_test_api_key(ApiKeyOwner::User(UserId::generate()));
        let mut value = serde_json::to_value(&key).unwrap();
        value["team_id"] = serde_json::Value::String(TeamId::generate().to_string());

        assert!(serde_json::from_value::<ApiKey>(value).is_err());
    }

    #[test]
    fn test_usability() {
        let now = Utc::now();
        let key = create_test_api_key(ApiKeyOwner::User(UserId::generate()));
        assert!(key.is_usable_at(now));

        let expired = key.clone().with_expiration(Some(now - Duration::minutes(1)));
        assert!(!expired.is_usable_at(now));
        assert!(expired.is_expired());

        let mut revoked = key;
        revoked.revoke();
        assert!(!revoked.is_active());
        assert!(revoked.revoked_at().is_some());
        assert!(!revoked.is_usable_at(now));
    }

    #[test]
    fn test_summary_has_no_hash() {
        let key = create_test_api_key(ApiKeyOwner::User(UserId::generate()));
        let summary = ApiKeySummary::from(&key);

        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("key_hash"));
        assert!(!json.contains(&"ab".repeat(32)));
        assert!(json.contains("fk_live_AbCdEfGh"));
    }
}
