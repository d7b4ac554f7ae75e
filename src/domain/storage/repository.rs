//! Storage trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

use super::entity::StorageEntity;
use super::query::{Filter, StorageQuery};

/// Generic resource store for any entity type
///
/// Backends must give `find` and `count_where` identical filter semantics so
/// that a count followed by a windowed fetch describes the same result set.
#[async_trait]
pub trait Storage<E>: Send + Sync + Debug
where
    E: StorageEntity + 'static,
{
    /// Retrieves an entity by its key
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError>;

    /// Retrieves all entities
    async fn list(&self) -> Result<Vec<E>, DomainError>;

    /// Creates a new entity, returns error if already exists
    async fn create(&self, entity: E) -> Result<E, DomainError>;

    /// Updates an existing entity, returns error if not found
    async fn update(&self, entity: E) -> Result<E, DomainError>;

    /// Replaces an entity only while the stored document matches `expected`
    ///
    /// The check and the write are a single atomic step. Returns `false` when
    /// the entity is gone or no longer matches.
    async fn update_if(&self, entity: E, expected: &Filter) -> Result<bool, DomainError>;

    /// Deletes an entity by its key, returns true if deleted
    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError>;

    /// Checks if an entity exists by its key
    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Returns the count of entities
    async fn count(&self) -> Result<usize, DomainError> {
        self.count_where(&Filter::All).await
    }

    /// Returns the entities matching a query, sorted and windowed
    async fn find(&self, query: &StorageQuery) -> Result<Vec<E>, DomainError>;

    /// Counts the entities matching a filter
    async fn count_where(&self, filter: &Filter) -> Result<usize, DomainError>;

    /// Returns the first entity matching a filter
    async fn find_one(&self, filter: &Filter) -> Result<Option<E>, DomainError> {
        let query = StorageQuery::new(filter.clone()).with_limit(1);
        Ok(self.find(&query).await?.into_iter().next())
    }
}
