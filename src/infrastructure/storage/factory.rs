//! Storage factory for runtime storage selection

use std::sync::Arc;

use sqlx::postgres::PgPool;

use crate::domain::storage::{Storage, StorageEntity};
use crate::domain::DomainError;

use super::in_memory::InMemoryStorage;
use super::postgres::{connect_pool, PostgresConfig, PostgresStorage};

/// Supported storage types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    InMemory,
    Postgres(PostgresConfig),
}

impl StorageConfig {
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// Factory for creating storage instances
///
/// Holds the shared connection pool so every table reuses it.
#[derive(Debug, Clone)]
pub enum StorageFactory {
    InMemory,
    Postgres(PgPool),
}

impl StorageFactory {
    /// Connect to the configured backend
    pub async fn connect(config: &StorageConfig) -> Result<Self, DomainError> {
        match config {
            StorageConfig::InMemory => Ok(Self::InMemory),
            StorageConfig::Postgres(pg_config) => {
                Ok(Self::Postgres(connect_pool(pg_config).await?))
            }
        }
    }

    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Creates a storage instance for one entity table
    pub async fn create<E>(&self, table_name: &str) -> Result<Arc<dyn Storage<E>>, DomainError>
    where
        E: StorageEntity + 'static,
    {
        match self {
            Self::InMemory => Ok(Arc::new(InMemoryStorage::<E>::new())),
            Self::Postgres(pool) => {
                let storage = PostgresStorage::<E>::new(pool.clone(), table_name)?;
                storage.ensure_table().await?;
                Ok(Arc::new(storage))
            }
        }
    }

    /// Liveness probe for the readiness endpoint
    pub async fn ping(&self) -> Result<(), DomainError> {
        match self {
            Self::InMemory => Ok(()),
            Self::Postgres(pool) => sqlx::query("SELECT 1")
                .execute(pool)
                .await
                .map(|_| ())
                .map_err(|e| DomainError::storage(format!("Database ping failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::Project;
    use crate::domain::user::UserId;

    #[test]
    fn test_storage_type_parse() {
        assert_eq!(StorageType::parse("memory"), Some(StorageType::InMemory));
        assert_eq!(StorageType::parse("in-memory"), Some(StorageType::InMemory));
        assert_eq!(StorageType::parse("postgres"), Some(StorageType::Postgres));
        assert_eq!(StorageType::parse("PG"), Some(StorageType::Postgres));
        assert_eq!(StorageType::parse("unknown"), None);
    }

    #[test]
    fn test_storage_config_types() {
        assert_eq!(StorageConfig::InMemory.storage_type(), StorageType::InMemory);
        let pg = StorageConfig::Postgres(PostgresConfig::new("postgres://localhost/test"));
        assert_eq!(pg.storage_type(), StorageType::Postgres);
    }

    #[tokio::test]
    async fn test_in_memory_factory() {
        let factory = StorageFactory::connect(&StorageConfig::InMemory).await.unwrap();
        let storage = factory.create::<Project>("projects").await.unwrap();

        storage
            .create(Project::new(UserId::generate(), "Skyfall").unwrap())
            .await
            .unwrap();

        assert_eq!(storage.count().await.unwrap(), 1);
        assert!(factory.ping().await.is_ok());
    }
}
