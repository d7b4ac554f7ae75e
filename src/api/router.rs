use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use super::admin;
use super::health;
use super::middleware::{
    logging_middleware, metrics_middleware, security_headers_middleware, MAX_BODY_SIZE,
};
use super::state::AppState;

/// Create the full router with application state
///
/// Probes are public; everything under `/api` requires an API key.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/api", admin::create_api_router(state.clone()))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::domain::access::Principal;
    use crate::domain::user::{User, UserRole};
    use crate::infrastructure::api_key::CreateApiKey;
    use crate::infrastructure::storage::StorageFactory;
    use crate::create_app_state_with_storage;

    const MASTER_KEY: &str = "router-test-master-key";

    struct TestApp {
        state: AppState,
        router: Router,
    }

    async fn test_app() -> TestApp {
        let mut config = AppConfig::default();
        config.security.encryption.master_key = Some(MASTER_KEY.to_string());
        config.activity.log_reads = true;
        config.bootstrap.enabled = false;

        let state = create_app_state_with_storage(&config, StorageFactory::in_memory())
            .await
            .unwrap();
        let router = create_router(state.clone());

        TestApp { state, router }
    }

    impl TestApp {
        async fn user_with_key(&self, username: &str, role: UserRole) -> (User, String) {
            let user = User::new(username, format!("{}@forgekit.dev", username), role).unwrap();
            self.state.users.create(user.clone()).await.unwrap();

            let principal = Principal::new(user.id().clone(), role);
            let created = self
                .state
                .api_key_service
                .create(
                    &principal,
                    CreateApiKey {
                        name: format!("{} key", username),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();

            (user, created.key)
        }

        async fn send(&self, method: &str, uri: &str, key: Option<&str>, body: Option<Value>) -> Response {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(key) = key {
                builder = builder.header("authorization", format!("Bearer {}", key));
            }

            let request = match body {
                Some(body) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            self.router.clone().oneshot(request).await.unwrap()
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = test_app().await;

        let response = app.send("GET", "/health", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert!(response.headers().contains_key("x-request-id"));

        let response = app.send("GET", "/ready", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_api_requires_key() {
        let app = test_app().await;

        let response = app.send("GET", "/api/projects", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "authentication_error");

        let response = app
            .send("GET", "/api/projects", Some("fk_live_not-a-real-key"), None)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_project_ownership_over_http() {
        let app = test_app().await;
        let (_, alice) = app.user_with_key("alice", UserRole::Member).await;
        let (_, bob) = app.user_with_key("bob", UserRole::Member).await;
        let (_, admin) = app.user_with_key("root", UserRole::Admin).await;

        let response = app
            .send("POST", "/api/projects", Some(&alice), Some(json!({"name": "Emberfall"})))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let project = body_json(response).await;
        let path = format!("/api/projects/{}", project["id"].as_str().unwrap());

        let response = app.send("GET", &path, Some(&bob), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app.send("GET", &path, Some(&admin), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.send("GET", "/api/projects", Some(&bob), None).await;
        let body = body_json(response).await;
        assert_eq!(body["pagination"]["total"], 0);

        let response = app.send("DELETE", &path, Some(&alice), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_invalid_id_is_bad_request() {
        let app = test_app().await;
        let (_, alice) = app.user_with_key("alice", UserRole::Member).await;

        let response = app
            .send("GET", "/api/projects/not-a-uuid", Some(&alice), None)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "invalid_id");
    }

    #[tokio::test]
    async fn test_credential_reveal_is_owner_only() {
        let app = test_app().await;
        let (_, alice) = app.user_with_key("alice", UserRole::Member).await;
        let (_, admin) = app.user_with_key("root", UserRole::Admin).await;

        let response = app
            .send(
                "POST",
                "/api/credentials",
                Some(&alice),
                Some(json!({"service": "elevenlabs", "name": "voice", "secret": "xi-abcdef123456"})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["key_prefix"], "xi-a****");
        assert!(created.get("encrypted_secret").is_none());

        let reveal = format!("/api/credentials/{}/reveal", created["id"].as_str().unwrap());

        let response = app.send("POST", &reveal, Some(&alice), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["cache-control"], "no-store");
        let body = body_json(response).await;
        assert_eq!(body["secret"], "xi-abcdef123456");

        let response = app.send("POST", &reveal, Some(&admin), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_key_create_and_rotate() {
        let app = test_app().await;
        let (_, alice) = app.user_with_key("alice", UserRole::Member).await;

        let response = app
            .send("POST", "/api/api-keys", Some(&alice), Some(json!({"name": "build server"})))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let new_key = created["key"].as_str().unwrap().to_string();
        assert!(new_key.starts_with("fk_live_"));

        let response = app.send("GET", "/api/projects", Some(&new_key), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let rotate = format!("/api/api-keys/{}/rotate", created["api_key"]["id"].as_str().unwrap());
        let response = app.send("POST", &rotate, Some(&alice), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.send("GET", "/api/projects", Some(&new_key), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_activity_is_recorded_for_api_requests() {
        let app = test_app().await;
        let (alice_user, alice) = app.user_with_key("alice", UserRole::Member).await;
        let (_, admin) = app.user_with_key("root", UserRole::Admin).await;

        let response = app
            .send("POST", "/api/projects", Some(&alice), Some(json!({"name": "Emberfall"})))
            .await;
        let project = body_json(response).await;
        let project_id = project["id"].as_str().unwrap().to_string();

        app.send("GET", &format!("/api/projects/{}", project_id), Some(&alice), None)
            .await;
        app.state.activity_logger.flush().await;

        let response = app.send("GET", "/api/activity-logs", Some(&alice), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let uri = format!("/api/activity-logs?user_id={}&sort_order=asc", alice_user.id());
        let response = app.send("GET", &uri, Some(&admin), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;

        let entries = body["data"].as_array().unwrap();
        assert_eq!(entries.len(), 2);

        let read = entries
            .iter()
            .find(|e| e["action"] == "read")
            .unwrap();
        assert_eq!(read["entity_type"], "projects");
        assert_eq!(read["entity_id"], project_id.as_str());
        assert_eq!(read["details"]["status"], 200);

        let create = entries
            .iter()
            .find(|e| e["action"] == "create")
            .unwrap();
        assert_eq!(create["entity_type"], "api");
    }

    #[tokio::test]
    async fn test_unauthenticated_requests_are_not_logged() {
        let app = test_app().await;
        let (_, admin) = app.user_with_key("root", UserRole::Admin).await;

        app.send("POST", "/api/projects", None, Some(json!({"name": "x"})))
            .await;
        app.state.activity_logger.flush().await;

        let response = app.send("GET", "/api/activity-logs", Some(&admin), None).await;
        let body = body_json(response).await;
        assert_eq!(body["pagination"]["total"], 0);
    }
}
