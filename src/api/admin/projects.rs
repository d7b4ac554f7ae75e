//! Project and asset endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, Query};
use crate::domain::content::{Asset, AssetId, Project, ProjectId};
use crate::domain::pagination::{Paginated, PaginationQuery};
use crate::infrastructure::content::{CreateAssetRequest, CreateProjectRequest};

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<Project>>, ApiError> {
    Ok(Json(state.content_service.list_projects(&principal, &query).await?))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state.content_service.create_project(&principal, request).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects/{project_id}
pub async fn get_project(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path(project_id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    let id = ProjectId::new(&project_id)?;
    Ok(Json(state.content_service.get_project(&id, &principal).await?))
}

/// DELETE /api/projects/{project_id}
pub async fn delete_project(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path(project_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = ProjectId::new(&project_id)?;
    state.content_service.delete_project(&id, &principal).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/projects/{project_id}/assets
pub async fn list_assets(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path(project_id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<Asset>>, ApiError> {
    let id = ProjectId::new(&project_id)?;
    Ok(Json(state.content_service.list_assets(&id, &principal, &query).await?))
}

/// POST /api/projects/{project_id}/assets
pub async fn create_asset(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path(project_id): Path<String>,
    Json(request): Json<CreateAssetRequest>,
) -> Result<(StatusCode, Json<Asset>), ApiError> {
    let id = ProjectId::new(&project_id)?;
    let asset = state
        .content_service
        .create_asset(&id, &principal, request)
        .await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

/// DELETE /api/assets/{asset_id}
pub async fn delete_asset(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path(asset_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = AssetId::new(&asset_id)?;
    state.content_service.delete_asset(&id, &principal).await?;
    Ok(StatusCode::NO_CONTENT)
}
