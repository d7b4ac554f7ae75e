//! API Key domain
//!
//! Domain types for API keys: the hashed persisted entity, its owner and the
//! hash-free summary returned to clients.

mod entity;
mod validation;

pub use entity::{ApiKey, ApiKeyId, ApiKeyOwner, ApiKeySummary};
pub use validation::{
    normalize_permissions, validate_api_key_name, validate_expiration, ApiKeyValidationError,
};
