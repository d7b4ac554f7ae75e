//! API Key generation
//!
//! Keys are `<scheme prefix><URL-safe base64 of 32 random bytes>`. Only the
//! SHA-256 hash (lowercase hex) and a short lookup prefix are ever stored.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

pub const DEFAULT_KEY_PREFIX: &str = "fk_live_";

/// Schemes recognised in addition to the active one
pub const LEGACY_KEY_PREFIXES: &[&str] = &["fk_test_", "sk_"];

const KEY_BYTES: usize = 32;
const LOOKUP_CHARS: usize = 8;

/// Result of generating a new API key
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    /// The full API key (only shown once at creation)
    pub key: String,
    /// The key prefix for identification
    pub prefix: String,
    /// The hashed key for storage
    pub hash: String,
}

/// Generator for secure API keys
#[derive(Debug, Clone)]
pub struct ApiKeyGenerator {
    /// Prefix for newly generated keys
    prefix: String,
    /// Every prefix scheme accepted on lookup, longest first
    accepted_prefixes: Vec<String>,
}

impl ApiKeyGenerator {
    /// Create a new API key generator
    ///
    /// The active prefix is always accepted, whether or not it is listed.
    pub fn new(prefix: impl Into<String>, accepted_prefixes: &[String]) -> Self {
        let prefix = prefix.into();

        let mut accepted: Vec<String> = accepted_prefixes
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect();
        if !accepted.contains(&prefix) {
            accepted.push(prefix.clone());
        }
        accepted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        Self {
            prefix,
            accepted_prefixes: accepted,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generate a new API key
    pub fn generate(&self) -> GeneratedApiKey {
        let mut random_bytes = [0u8; KEY_BYTES];
        OsRng.fill_bytes(&mut random_bytes);

        let encoded = URL_SAFE_NO_PAD.encode(random_bytes);
        let key = format!("{}{}", self.prefix, encoded);

        // The lookup prefix includes scheme prefix + first 8 chars of random portion
        let lookup_prefix = format!("{}{}", self.prefix, &encoded[..LOOKUP_CHARS]);

        let hash = hash_key(&key);

        GeneratedApiKey {
            key,
            prefix: lookup_prefix,
            hash,
        }
    }

    /// Check a candidate key against a stored hash in constant time
    ///
    /// Any mismatch, including a malformed stored hash, yields `false`.
    pub fn validate(&self, candidate: &str, stored_hash: &str) -> bool {
        let computed = hash_key(candidate);
        constant_time_eq(computed.as_bytes(), stored_hash.as_bytes())
    }

    /// Extract the lookup prefix (scheme + 8 random chars) from a raw key
    ///
    /// Returns `None` for unknown schemes or keys too short to carry one.
    pub fn extract_prefix(&self, key: &str) -> Option<String> {
        let scheme = self
            .accepted_prefixes
            .iter()
            .find(|p| key.starts_with(p.as_str()))?;

        let rest = &key[scheme.len()..];
        let lookup: String = rest.chars().take(LOOKUP_CHARS).collect();

        if lookup.chars().count() < LOOKUP_CHARS {
            return None;
        }

        Some(format!("{}{}", scheme, lookup))
    }
}

impl Default for ApiKeyGenerator {
    fn default() -> Self {
        let legacy: Vec<String> = LEGACY_KEY_PREFIXES.iter().map(|p| p.to_string()).collect();
        Self::new(DEFAULT_KEY_PREFIX, &legacy)
    }
}

/// Hash an API key for storage (lowercase hex SHA-256)
pub fn hash_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Constant-time byte comparison
///
/// Runs over every byte of equal-length inputs without early exit. Length is
/// not secret here: stored hashes are always 64 hex characters.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;

    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}
