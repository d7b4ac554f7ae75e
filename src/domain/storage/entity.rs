//! Storage entity traits and types

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be used as storage keys
pub trait StorageKey: Clone + Debug + Send + Sync + Eq + std::hash::Hash {
    /// Returns the key as a string for storage backends that require string keys
    fn as_str(&self) -> &str;
}

/// Trait for types that can be stored
///
/// Entities are persisted as JSON documents; query filters address the
/// document's top-level field names.
pub trait StorageEntity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    /// The key type for this entity
    type Key: StorageKey;

    /// Name of the serialized field holding the key
    const KEY_FIELD: &'static str = "id";

    /// Fields holding RFC 3339 timestamps, sorted chronologically
    const TIMESTAMP_FIELDS: &'static [&'static str] = &["created_at", "updated_at"];

    /// Returns the entity's key
    fn key(&self) -> &Self::Key;
}

/// An entity that belongs to exactly one principal
pub trait OwnedEntity: StorageEntity {
    /// Name of the serialized field holding the owner's user ID
    const OWNER_FIELD: &'static str = "owner_id";

    /// Human readable entity name used in error messages
    const RESOURCE_NAME: &'static str;

    /// Returns the owning user's ID
    fn owner_id(&self) -> &str;
}
