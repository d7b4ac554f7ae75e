//! API Key infrastructure
//!
//! Key generation, hashing and validation, plus the service that manages
//! key records and authenticates requests.

mod generator;
mod service;

pub use generator::{
    hash_key, ApiKeyGenerator, GeneratedApiKey, DEFAULT_KEY_PREFIX, LEGACY_KEY_PREFIXES,
};
pub use service::{ApiKeyService, CreateApiKey, CreatedApiKey};
