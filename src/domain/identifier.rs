//! Resource identifiers
//!
//! Every persisted resource is keyed by a lowercase hyphenated UUID string.
//! The HTTP activity hook relies on this shape to recognise entity IDs in
//! request paths.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::domain::DomainError;

/// Matches a hyphenated UUID anywhere in a string, case-insensitively
pub static UUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
});

/// Parse and canonicalise a UUID string
pub fn parse_uuid(kind: &str, value: &str) -> Result<String, DomainError> {
    Uuid::parse_str(value.trim())
        .map(|uuid| uuid.hyphenated().to_string())
        .map_err(|_| DomainError::invalid_id(format!("{} '{}' is not a valid UUID", kind, value)))
}

/// Declares a UUID-backed identifier newtype usable as a storage key
#[macro_export]
macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an identifier, rejecting anything that is not a UUID
            pub fn new(id: impl AsRef<str>) -> Result<Self, $crate::domain::DomainError> {
                $crate::domain::identifier::parse_uuid($kind, id.as_ref()).map(Self)
            }

            /// Generate a fresh random identifier
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().hyphenated().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::domain::DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl $crate::domain::storage::StorageKey for $name {
            fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}
