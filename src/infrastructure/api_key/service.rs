//! API Key service
//!
//! Provides high-level operations for API key management and request
//! authentication.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::access::Principal;
use crate::domain::api_key::{
    normalize_permissions, validate_api_key_name, validate_expiration, ApiKey, ApiKeyId,
    ApiKeyOwner, ApiKeySummary,
};
use crate::domain::pagination::{ListSpec, PageLimits, Paginated, PaginationQuery};
use crate::domain::storage::{Filter, SortOrder, SortSpec, Storage, StorageQuery};
use crate::domain::user::User;
use crate::domain::DomainError;
use crate::infrastructure::access::{TeamAccess, TeamAccessService};
use crate::infrastructure::observability::{record_access_denied, record_api_key_validation};
use crate::infrastructure::pagination::paginate;

use super::generator::ApiKeyGenerator;

const API_KEY_SEARCH_FIELDS: &[&str] = &["name", "key_prefix"];
const API_KEY_SORT_FIELDS: &[&str] = &["name", "created_at", "updated_at", "last_used_at", "expires_at"];

/// Input for creating an API key
#[derive(Debug, Clone, Default)]
pub struct CreateApiKey {
    pub name: String,
    /// Defaults to the calling user
    pub owner: Option<ApiKeyOwner>,
    pub permissions: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Result of creating or rotating an API key
#[derive(Debug, Clone, Serialize)]
pub struct CreatedApiKey {
    pub api_key: ApiKeySummary,
    /// The full secret key (only returned once)
    pub key: String,
}

/// API Key service for managing API keys
#[derive(Debug, Clone)]
pub struct ApiKeyService {
    keys: Arc<dyn Storage<ApiKey>>,
    users: Arc<dyn Storage<User>>,
    teams: TeamAccessService,
    generator: ApiKeyGenerator,
    page_limits: PageLimits,
}

impl ApiKeyService {
    pub fn new(
        keys: Arc<dyn Storage<ApiKey>>,
        users: Arc<dyn Storage<User>>,
        teams: TeamAccessService,
    ) -> Self {
        Self {
            keys,
            users,
            teams,
            generator: ApiKeyGenerator::default(),
            page_limits: PageLimits::default(),
        }
    }

    /// Create with a custom generator
    pub fn with_generator(mut self, generator: ApiKeyGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.page_limits = limits;
        self
    }

    pub fn generator(&self) -> &ApiKeyGenerator {
        &self.generator
    }

    /// Create a new API key; the raw key is only available in the result
    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateApiKey,
    ) -> Result<CreatedApiKey, DomainError> {
        validate_api_key_name(&request.name)?;
        let permissions = normalize_permissions(request.permissions)?;
        validate_expiration(request.expires_at)?;

        let owner = request
            .owner
            .unwrap_or_else(|| ApiKeyOwner::User(principal.user_id.clone()));

        self.authorize_owner(principal, &owner, true).await?;

        if let ApiKeyOwner::User(user_id) = &owner {
            if *user_id != principal.user_id && !self.users.exists(user_id).await? {
                return Err(DomainError::not_found(format!("User '{}' not found", user_id)));
            }
        }

        let generated = self.generator.generate();

        let api_key = ApiKey::new(
            request.name.trim(),
            owner,
            generated.hash,
            &generated.prefix,
            principal.user_id.clone(),
        )
        .with_permissions(permissions)
        .with_expiration(request.expires_at);

        let created = self.keys.create(api_key).await?;

        info!(
            key_id = %created.id(),
            key_prefix = %created.key_prefix(),
            created_by = %principal.user_id,
            "API key created"
        );

        Ok(CreatedApiKey {
            api_key: ApiKeySummary::from(&created),
            key: generated.key,
        })
    }

    /// Every key of one owner, newest first
    pub async fn list_for_owner(
        &self,
        principal: &Principal,
        owner: &ApiKeyOwner,
    ) -> Result<Vec<ApiKeySummary>, DomainError> {
        self.authorize_owner(principal, owner, false).await?;

        let query = StorageQuery::new(Filter::eq(owner.field(), owner.id_str()))
            .with_sort(SortSpec::new("created_at", SortOrder::Desc));

        let keys = self.keys.find(&query).await?;

        Ok(keys.iter().map(ApiKeySummary::from).collect())
    }

    /// Paginated listing: admin and owner roles see every key, everyone else their own
    pub async fn list(
        &self,
        principal: &Principal,
        query: &PaginationQuery,
    ) -> Result<Paginated<ApiKeySummary>, DomainError> {
        let base = if principal.bypasses_ownership() {
            Filter::All
        } else {
            Filter::eq("user_id", principal.user_id.as_str())
        };

        let spec = ListSpec::new(API_KEY_SEARCH_FIELDS, API_KEY_SORT_FIELDS, "created_at")
            .with_limits(self.page_limits);

        let page = paginate(self.keys.as_ref(), query, &spec, base).await?;

        Ok(page.map(|key| ApiKeySummary::from(&key)))
    }

    /// Get a key the principal may manage
    pub async fn get(&self, id: &ApiKeyId, principal: &Principal) -> Result<ApiKey, DomainError> {
        let key = self
            .keys
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", id)))?;

        self.authorize_owner(principal, &key.owner(), true).await?;

        Ok(key)
    }

    /// Replace the secret; the previous key stops validating immediately
    pub async fn rotate(
        &self,
        id: &ApiKeyId,
        principal: &Principal,
    ) -> Result<CreatedApiKey, DomainError> {
        let mut key = self.get(id, principal).await?;

        if key.revoked_at().is_some() {
            return Err(DomainError::conflict(format!(
                "API key '{}' has been revoked",
                id
            )));
        }

        let generated = self.generator.generate();
        key.rotate(generated.hash, &generated.prefix);

        let updated = self.keys.update(key).await?;

        info!(
            key_id = %id,
            key_prefix = %updated.key_prefix(),
            user_id = %principal.user_id,
            "API key rotated"
        );

        Ok(CreatedApiKey {
            api_key: ApiKeySummary::from(&updated),
            key: generated.key,
        })
    }

    /// Soft-revoke a key; revoking twice keeps the first timestamp
    pub async fn revoke(
        &self,
        id: &ApiKeyId,
        principal: &Principal,
    ) -> Result<ApiKeySummary, DomainError> {
        let mut key = self.get(id, principal).await?;

        key.revoke();
        let updated = self.keys.update(key).await?;

        info!(key_id = %id, user_id = %principal.user_id, "API key revoked");

        Ok(ApiKeySummary::from(&updated))
    }

    /// Resolve a raw key to its record
    ///
    /// Every failure (unknown scheme, no prefix match, hash mismatch, inactive,
    /// expired, revoked, storage error) yields `None`. The usage timestamp is
    /// written only if the stored hash and active flag are still the ones
    /// that were verified.
    pub async fn authenticate(&self, raw_key: &str) -> Option<ApiKey> {
        let Some(prefix) = self.generator.extract_prefix(raw_key) else {
            record_api_key_validation("malformed");
            return None;
        };

        let query = StorageQuery::new(Filter::eq("key_prefix", prefix.as_str()));
        let candidates = match self.keys.find(&query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(key_prefix = %prefix, error = %e, "API key lookup failed");
                record_api_key_validation("error");
                return None;
            }
        };

        let Some(mut key) = candidates
            .into_iter()
            .find(|key| self.generator.validate(raw_key, key.key_hash()))
        else {
            debug!(key_prefix = %prefix, "API key hash verification failed");
            record_api_key_validation("invalid");
            return None;
        };

        if !key.is_usable_at(Utc::now()) {
            debug!(key_id = %key.id(), "API key is inactive, revoked or expired");
            record_api_key_validation("inactive");
            return None;
        }

        // A rotate or revoke may have landed since the lookup
        let unchanged = Filter::eq("key_hash", key.key_hash()).and(Filter::eq("is_active", "true"));
        key.record_usage();

        match self.keys.update_if(key.clone(), &unchanged).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(key_id = %key.id(), "API key changed during authentication");
                record_api_key_validation("inactive");
                return None;
            }
            Err(e) => {
                warn!(key_id = %key.id(), error = %e, "Failed to record API key usage");
            }
        }

        record_api_key_validation("valid");
        Some(key)
    }

    /// The principal a key acts for
    ///
    /// User keys act for their owner; team keys act for the user who created
    /// them. The role always comes from the current user record.
    pub async fn resolve_principal(&self, key: &ApiKey) -> Result<Option<Principal>, DomainError> {
        let user_id = match key.owner() {
            ApiKeyOwner::User(user_id) => user_id,
            ApiKeyOwner::Team(_) => key.created_by().clone(),
        };

        Ok(self.users.get(&user_id).await?.map(|user| {
            Principal::new(user.id().clone(), user.role()).with_api_key(key.id().clone())
        }))
    }

    /// Authenticate a raw key straight to a principal
    pub async fn authenticate_principal(&self, raw_key: &str) -> Option<Principal> {
        let key = self.authenticate(raw_key).await?;

        match self.resolve_principal(&key).await {
            Ok(Some(principal)) => Some(principal),
            Ok(None) => {
                warn!(key_id = %key.id(), "API key principal no longer exists");
                None
            }
            Err(e) => {
                warn!(key_id = %key.id(), error = %e, "Failed to resolve API key principal");
                None
            }
        }
    }

    /// Whether the principal may act on keys of `owner`
    ///
    /// User keys: the user themselves or an admin/owner role. Team keys: any
    /// member may read, team owners and admins may manage.
    async fn authorize_owner(
        &self,
        principal: &Principal,
        owner: &ApiKeyOwner,
        manage: bool,
    ) -> Result<(), DomainError> {
        match owner {
            ApiKeyOwner::User(user_id) => {
                if *user_id == principal.user_id || principal.bypasses_ownership() {
                    return Ok(());
                }

                record_access_denied("api_key");
                Err(DomainError::forbidden(
                    "You do not have access to this user's API keys",
                ))
            }
            ApiKeyOwner::Team(team_id) => {
                match self.teams.verify_team_membership(team_id, principal).await? {
                    TeamAccess::AdminBypass => Ok(()),
                    TeamAccess::Role(_) if !manage => Ok(()),
                    TeamAccess::Role(role) if role.can_manage_members() => Ok(()),
                    TeamAccess::Role(_) => {
                        record_access_denied("api_key");
                        Err(DomainError::forbidden(
                            "Only team owners and admins can manage team API keys",
                        ))
                    }
                }
            }
        }
    }
}
