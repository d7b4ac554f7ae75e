//! API key management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, Query};
use crate::domain::api_key::{ApiKeyId, ApiKeyOwner, ApiKeySummary};
use crate::domain::pagination::{Paginated, PaginationQuery};
use crate::domain::team::TeamId;
use crate::domain::user::UserId;
use crate::infrastructure::api_key::{CreateApiKey, CreatedApiKey};

/// Request to create a new API key
///
/// At most one of `user_id` and `team_id` may be set; neither means a key
/// for the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CreateApiKeyRequest {
    fn owner(&self) -> Result<Option<ApiKeyOwner>, ApiError> {
        match (&self.user_id, &self.team_id) {
            (Some(_), Some(_)) => Err(ApiError::bad_request(
                "An API key belongs to either a user or a team, not both",
            )),
            (Some(user_id), None) => Ok(Some(ApiKeyOwner::User(UserId::new(user_id)?))),
            (None, Some(team_id)) => Ok(Some(ApiKeyOwner::Team(TeamId::new(team_id)?))),
            (None, None) => Ok(None),
        }
    }
}

/// GET /api/api-keys
pub async fn list_api_keys(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<ApiKeySummary>>, ApiError> {
    let page = state.api_key_service.list(&principal, &query).await?;
    Ok(Json(page))
}

/// POST /api/api-keys
///
/// The plaintext key appears in this response only.
pub async fn create_api_key(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<CreatedApiKey>), ApiError> {
    debug!(name = %request.name, "Creating API key");

    let owner = request.owner()?;
    let created = state
        .api_key_service
        .create(
            &principal,
            CreateApiKey {
                name: request.name,
                owner,
                permissions: request.permissions,
                expires_at: request.expires_at,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/api-keys/{key_id}
pub async fn get_api_key(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path(key_id): Path<String>,
) -> Result<Json<ApiKeySummary>, ApiError> {
    let id = ApiKeyId::new(&key_id)?;
    let key = state.api_key_service.get(&id, &principal).await?;
    Ok(Json(ApiKeySummary::from(&key)))
}

/// POST /api/api-keys/{key_id}/rotate
pub async fn rotate_api_key(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path(key_id): Path<String>,
) -> Result<Json<CreatedApiKey>, ApiError> {
    debug!(key_id = %key_id, "Rotating API key");

    let id = ApiKeyId::new(&key_id)?;
    let rotated = state.api_key_service.rotate(&id, &principal).await?;
    Ok(Json(rotated))
}

/// POST /api/api-keys/{key_id}/revoke
pub async fn revoke_api_key(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path(key_id): Path<String>,
) -> Result<Json<ApiKeySummary>, ApiError> {
    debug!(key_id = %key_id, "Revoking API key");

    let id = ApiKeyId::new(&key_id)?;
    let revoked = state.api_key_service.revoke(&id, &principal).await?;
    Ok(Json(revoked))
}

/// GET /api/teams/{team_id}/api-keys
pub async fn list_team_api_keys(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<ApiKeySummary>>, ApiError> {
    let owner = ApiKeyOwner::Team(TeamId::new(&team_id)?);
    let keys = state.api_key_service.list_for_owner(&principal, &owner).await?;
    Ok(Json(keys))
}
