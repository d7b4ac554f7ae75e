//! Team and membership endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::team::{Team, TeamId, TeamMembership, TeamRole};
use crate::domain::user::UserId;

/// Request to create a new team
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTeamApiRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request to add a member
#[derive(Debug, Clone, Deserialize)]
pub struct AddMemberApiRequest {
    pub user_id: String,
    #[serde(default)]
    pub role: TeamRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id().to_string(),
            name: team.name().to_string(),
            description: team.description().map(String::from),
            created_by: team.created_by().to_string(),
            created_at: team.created_at().to_rfc3339(),
            updated_at: team.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberResponse {
    pub user_id: String,
    pub role: TeamRole,
    pub joined_at: String,
}

impl From<&TeamMembership> for MemberResponse {
    fn from(membership: &TeamMembership) -> Self {
        Self {
            user_id: membership.user_id().to_string(),
            role: membership.role(),
            joined_at: membership.joined_at().to_rfc3339(),
        }
    }
}

/// POST /api/teams
pub async fn create_team(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Json(request): Json<CreateTeamApiRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    debug!(name = %request.name, "Creating team");

    let team = state
        .team_service
        .create(&principal, &request.name, request.description)
        .await?;

    Ok((StatusCode::CREATED, Json(TeamResponse::from(&team))))
}

/// GET /api/teams/{team_id}
pub async fn get_team(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path(team_id): Path<String>,
) -> Result<Json<TeamResponse>, ApiError> {
    let id = TeamId::new(&team_id)?;
    let team = state.team_service.get(&id, &principal).await?;
    Ok(Json(TeamResponse::from(&team)))
}

/// GET /api/teams/{team_id}/members
pub async fn list_members(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let id = TeamId::new(&team_id)?;
    let members = state.team_service.list_members(&id, &principal).await?;
    Ok(Json(members.iter().map(MemberResponse::from).collect()))
}

/// POST /api/teams/{team_id}/members
pub async fn add_member(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path(team_id): Path<String>,
    Json(request): Json<AddMemberApiRequest>,
) -> Result<(StatusCode, Json<MemberResponse>), ApiError> {
    let id = TeamId::new(&team_id)?;
    let user_id = UserId::new(&request.user_id)?;

    let membership = state
        .team_service
        .add_member(&id, &principal, &user_id, request.role)
        .await?;

    Ok((StatusCode::CREATED, Json(MemberResponse::from(&membership))))
}

/// DELETE /api/teams/{team_id}/members/{user_id}
pub async fn remove_member(
    State(state): State<AppState>,
    RequireUser(principal): RequireUser,
    Path((team_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let id = TeamId::new(&team_id)?;
    let user_id = UserId::new(&user_id)?;

    state
        .team_service
        .remove_member(&id, &principal, &user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
