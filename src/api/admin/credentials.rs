//! Third-party credential endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, Query};
use crate::domain::credentials::{CredentialId, CredentialSummary};
use crate::domain::pagination::{Paginated, PaginationQuery};
use crate::infrastructure::credentials::{CreateCredentialRequest, UpdateCredentialRequest};

/// Optional narrowing of the credential list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialFilterQuery {
    pub service: Option<String>,
}

/// Decrypted secret
#[derive(Debug, Clone, Serialize)]
pub struct RevealedSecret {
    pub id: String,
    pub secret: String,
}

/// GET /api/credentials
pub async fn list_credentials(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Query(query): Query<PaginationQuery>,
    Query(filter): Query<CredentialFilterQuery>,
) -> Result<Json<Paginated<CredentialSummary>>, ApiError> {
    let page = state
        .credential_service
        .list(&principal, &query, filter.service.as_deref())
        .await?;
    Ok(Json(page))
}

/// POST /api/credentials
pub async fn create_credential(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Json(request): Json<CreateCredentialRequest>,
) -> Result<(StatusCode, Json<CredentialSummary>), ApiError> {
    let created = state.credential_service.create(&principal, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/credentials/{credential_id}
pub async fn get_credential(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path(credential_id): Path<String>,
) -> Result<Json<CredentialSummary>, ApiError> {
    let id = CredentialId::new(&credential_id)?;
    Ok(Json(state.credential_service.get(&id, &principal).await?))
}

/// PUT /api/credentials/{credential_id}
pub async fn update_credential(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path(credential_id): Path<String>,
    Json(request): Json<UpdateCredentialRequest>,
) -> Result<Json<CredentialSummary>, ApiError> {
    let id = CredentialId::new(&credential_id)?;
    let updated = state
        .credential_service
        .update(&id, &principal, request)
        .await?;
    Ok(Json(updated))
}

/// DELETE /api/credentials/{credential_id}
pub async fn delete_credential(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path(credential_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = CredentialId::new(&credential_id)?;
    state.credential_service.delete(&id, &principal).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/credentials/{credential_id}/reveal
///
/// Owner only. The response is never cached (see the security headers).
pub async fn reveal_credential(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path(credential_id): Path<String>,
) -> Result<Json<RevealedSecret>, ApiError> {
    let id = CredentialId::new(&credential_id)?;
    let secret = state.credential_service.reveal(&id, &principal).await?;

    Ok(Json(RevealedSecret {
        id: id.to_string(),
        secret,
    }))
}
