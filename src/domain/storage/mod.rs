//! Storage domain - Generic storage abstraction layer

mod entity;
mod query;
mod repository;

pub use entity::{OwnedEntity, StorageEntity, StorageKey};
pub use query::{apply_query, validate_field_name, Filter, SortOrder, SortSpec, StorageQuery};
pub use repository::Storage;

#[cfg(test)]
pub use repository::mock;
