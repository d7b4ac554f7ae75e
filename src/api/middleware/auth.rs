//! API key authentication
//!
//! `auth_middleware` resolves the caller once per request and stores the
//! resulting [`Principal`] in the request extensions. Handlers read it back
//! through [`RequireUser`] or [`RequireAdmin`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::access::Principal;

/// Authenticate the request's API key and attach the principal
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let raw_key = extract_api_key_from_headers(request.headers())?;

    let principal = state
        .api_key_service
        .authenticate_principal(&raw_key)
        .await
        .ok_or_else(|| ApiError::unauthorized("Invalid API key"))?;

    debug!(
        user_id = %principal.user_id,
        role = %principal.role.as_str(),
        "Request authenticated"
    );

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Any authenticated caller
#[derive(Debug, Clone)]
pub struct RequireUser(pub Principal);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(RequireUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// An authenticated caller with the platform admin role
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Principal);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireUser(principal) = RequireUser::from_request_parts(parts, state).await?;

        if !principal.is_admin() {
            return Err(ApiError::forbidden("Admin access required"));
        }

        Ok(RequireAdmin(principal))
    }
}

/// Read the key from `Authorization: Bearer` or `X-API-Key`
pub fn extract_api_key_from_headers(headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }
    }

    if let Some(api_key_header) = headers.get("x-api-key") {
        let key = api_key_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid X-API-Key header encoding"))?
            .trim();

        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }

    Err(ApiError::unauthorized(
        "API key required. Provide via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header",
    ))
}
