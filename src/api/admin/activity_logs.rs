//! Activity log query endpoint

use axum::extract::State;
use serde::Deserialize;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, Query};
use crate::domain::activity::ActivityLogEntry;
use crate::domain::pagination::{Paginated, PaginationQuery};
use crate::domain::user::UserId;
use crate::infrastructure::activity::ActivityLogFilter;

/// Exact-match filters on top of pagination
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityLogFilterQuery {
    pub user_id: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub action: Option<String>,
}

impl ActivityLogFilterQuery {
    fn into_filter(self) -> Result<ActivityLogFilter, ApiError> {
        Ok(ActivityLogFilter {
            user_id: self.user_id.map(UserId::new).transpose()?,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            action: self.action,
        })
    }
}

/// GET /api/activity-logs
pub async fn list_activity_logs(
    State(state): State<AppState>,
    RequireAdmin(principal): RequireAdmin,
    Query(query): Query<PaginationQuery>,
    Query(filter): Query<ActivityLogFilterQuery>,
) -> Result<Json<Paginated<ActivityLogEntry>>, ApiError> {
    let filter = filter.into_filter()?;
    let page = state
        .activity_logger
        .list(&principal, &query, &filter)
        .await?;
    Ok(Json(page))
}
