//! API Key validation utilities

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::DomainError;

/// Errors that can occur during API key validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiKeyValidationError {
    #[error("API key name cannot be empty")]
    EmptyName,

    #[error("API key name exceeds maximum length of {0} characters")]
    NameTooLong(usize),

    #[error("Invalid permission '{0}'. Permissions are non-empty tokens of letters, digits, '_', ':', '.', '-' or '*'")]
    InvalidPermission(String),

    #[error("API key cannot have more than {0} permissions")]
    TooManyPermissions(usize),

    #[error("Expiration must be in the future")]
    ExpirationInPast,

    #[error("API key must be owned by exactly one user or team")]
    InvalidOwner,
}

impl From<ApiKeyValidationError> for DomainError {
    fn from(error: ApiKeyValidationError) -> Self {
        DomainError::validation(error.to_string())
    }
}

const MAX_API_KEY_NAME_LENGTH: usize = 100;
const MAX_PERMISSIONS: usize = 64;
const MAX_PERMISSION_LENGTH: usize = 64;

/// Validate an API key display name
pub fn validate_api_key_name(name: &str) -> Result<(), ApiKeyValidationError> {
    if name.trim().is_empty() {
        return Err(ApiKeyValidationError::EmptyName);
    }

    if name.len() > MAX_API_KEY_NAME_LENGTH {
        return Err(ApiKeyValidationError::NameTooLong(MAX_API_KEY_NAME_LENGTH));
    }

    Ok(())
}

/// Validate and normalise a permission list
///
/// Order is preserved; duplicates after the first occurrence are dropped.
pub fn normalize_permissions(
    permissions: Vec<String>,
) -> Result<Vec<String>, ApiKeyValidationError> {
    if permissions.len() > MAX_PERMISSIONS {
        return Err(ApiKeyValidationError::TooManyPermissions(MAX_PERMISSIONS));
    }

    let mut normalized: Vec<String> = Vec::with_capacity(permissions.len());

    for permission in permissions {
        let permission = permission.trim().to_string();

        let valid = !permission.is_empty()
            && permission.len() <= MAX_PERMISSION_LENGTH
            && permission
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-' | '*'));

        if !valid {
            return Err(ApiKeyValidationError::InvalidPermission(permission));
        }

        if !normalized.contains(&permission) {
            normalized.push(permission);
        }
    }

    Ok(normalized)
}

/// Expiration, when present, must lie in the future
pub fn validate_expiration(expires_at: Option<DateTime<Utc>>) -> Result<(), ApiKeyValidationError> {
    match expires_at {
        Some(at) if at <= Utc::now() => Err(ApiKeyValidationError::ExpirationInPast),
        _ => Ok(()),
    }
}
