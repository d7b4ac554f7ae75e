//! Authenticated resource endpoints mounted under `/api`

pub mod activity_logs;
pub mod api_keys;
pub mod credentials;
pub mod projects;
pub mod teams;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use super::middleware::{activity_middleware, auth_middleware};
use super::state::AppState;

/// Create the authenticated API router
///
/// Every route requires an API key. Completed requests are fed to the
/// activity logger.
pub fn create_api_router(state: AppState) -> Router<AppState> {
    Router::new()
        // API keys
        .route(
            "/api-keys",
            get(api_keys::list_api_keys).post(api_keys::create_api_key),
        )
        .route("/api-keys/{key_id}", get(api_keys::get_api_key))
        .route("/api-keys/{key_id}/rotate", post(api_keys::rotate_api_key))
        .route("/api-keys/{key_id}/revoke", post(api_keys::revoke_api_key))
        // Credentials
        .route(
            "/credentials",
            get(credentials::list_credentials).post(credentials::create_credential),
        )
        .route(
            "/credentials/{credential_id}",
            get(credentials::get_credential)
                .put(credentials::update_credential)
                .delete(credentials::delete_credential),
        )
        .route(
            "/credentials/{credential_id}/reveal",
            post(credentials::reveal_credential),
        )
        // Projects and assets
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{project_id}",
            get(projects::get_project).delete(projects::delete_project),
        )
        .route(
            "/projects/{project_id}/assets",
            get(projects::list_assets).post(projects::create_asset),
        )
        .route("/assets/{asset_id}", delete(projects::delete_asset))
        // Teams
        .route("/teams", post(teams::create_team))
        .route("/teams/{team_id}", get(teams::get_team))
        .route(
            "/teams/{team_id}/members",
            get(teams::list_members).post(teams::add_member),
        )
        .route(
            "/teams/{team_id}/members/{user_id}",
            delete(teams::remove_member),
        )
        .route("/teams/{team_id}/api-keys", get(api_keys::list_team_api_keys))
        // Audit trail
        .route("/activity-logs", get(activity_logs::list_activity_logs))
        // Layers added later run first: authenticate, then audit.
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            activity_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
