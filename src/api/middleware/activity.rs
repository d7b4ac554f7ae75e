//! Automatic activity logging for authenticated API requests

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, OriginalUri, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde_json::{Map, Value};

use crate::api::state::AppState;
use crate::domain::access::Principal;
use crate::domain::activity::RequestContext;
use crate::infrastructure::activity::derive_activity;

/// Record one activity entry per completed request
///
/// Runs inside `auth_middleware`, so the principal is always present for
/// requests that reach a handler. Entries are queued, never awaited.
pub async fn activity_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    // Nested routers see a stripped URI; the audit path is the public one.
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let method = request.method().clone();

    let derived = derive_activity(method.as_str(), &path, state.config.activity.log_reads);
    let principal = request.extensions().get::<Principal>().cloned();
    let context = request_context(&request);

    let response = next.run(request).await;

    if let (Some(derived), Some(principal)) = (derived, principal) {
        let mut details = Map::new();
        details.insert("method".to_string(), Value::from(method.as_str()));
        details.insert("path".to_string(), Value::from(path));
        details.insert("status".to_string(), Value::from(response.status().as_u16()));
        if let Some(key_id) = &principal.api_key_id {
            details.insert("api_key_id".to_string(), Value::from(key_id.as_str()));
        }

        state.activity_logger.log(
            Some(principal.user_id),
            derived.entity_type,
            derived.entity_id,
            derived.action,
            details,
            context,
        );
    }

    response
}

fn request_context(request: &Request) -> RequestContext {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    RequestContext {
        ip_address: client_ip(request.headers()).or(peer),
        user_agent: header_text(request.headers(), header::USER_AGENT.as_str()),
    }
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    header_text(headers, "x-forwarded-for")
        .and_then(|value| {
            value
                .split(',')
                .next()
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
                .map(str::to_string)
        })
        .or_else(|| header_text(headers, "x-real-ip"))
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
