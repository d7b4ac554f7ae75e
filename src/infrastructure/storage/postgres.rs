//! PostgreSQL storage implementation with connection pooling
//!
//! Entities are stored as JSONB documents. Filters are translated into
//! predicates on `data->>'field'` with every value passed as a bound
//! parameter; field names are validated identifiers before they are
//! interpolated.

use std::fmt::Debug;
use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use crate::domain::storage::{
    validate_field_name, Filter, SortOrder, Storage, StorageEntity, StorageKey, StorageQuery,
};
use crate::domain::DomainError;

/// PostgreSQL storage configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/forgekit".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// Open a connection pool shared by every table
pub async fn connect_pool(config: &PostgresConfig) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))
}

/// A WHERE clause plus its positional text parameters
#[derive(Debug, Clone, PartialEq)]
struct SqlPredicate {
    sql: String,
    params: Vec<String>,
}

fn build_predicate(filter: &Filter) -> Result<SqlPredicate, DomainError> {
    let mut params = Vec::new();
    let sql = render_filter(filter, &mut params)?;
    Ok(SqlPredicate { sql, params })
}

fn render_filter(filter: &Filter, params: &mut Vec<String>) -> Result<String, DomainError> {
    match filter {
        Filter::All => Ok("TRUE".to_string()),
        Filter::Eq { field, value } => {
            validate_field_name(field)?;
            params.push(value.clone());
            Ok(format!("(data->>'{}') = ${}", field, params.len()))
        }
        Filter::Contains { field, needle } => {
            validate_field_name(field)?;
            params.push(escape_like(needle));
            Ok(format!(
                "(data->>'{}') ILIKE '%' || ${} || '%' ESCAPE '\\'",
                field,
                params.len()
            ))
        }
        Filter::And(filters) | Filter::Or(filters) if filters.is_empty() => {
            Ok(if matches!(filter, Filter::And(_)) {
                "TRUE".to_string()
            } else {
                "FALSE".to_string()
            })
        }
        Filter::And(filters) => join_filters(filters, " AND ", params),
        Filter::Or(filters) => join_filters(filters, " OR ", params),
    }
}

fn join_filters(
    filters: &[Filter],
    separator: &str,
    params: &mut Vec<String>,
) -> Result<String, DomainError> {
    let parts = filters
        .iter()
        .map(|f| render_filter(f, params))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(format!("({})", parts.join(separator)))
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Timestamp fields sort as `timestamptz`; jsonb string order breaks on
/// chrono's variable-width fractions.
fn order_clause(query: &StorageQuery, timestamp_fields: &[&str]) -> Result<String, DomainError> {
    match &query.sort {
        Some(sort) => {
            validate_field_name(&sort.field)?;
            let nulls = match sort.order {
                SortOrder::Asc => "NULLS FIRST",
                SortOrder::Desc => "NULLS LAST",
            };
            let expression = if timestamp_fields.contains(&sort.field.as_str()) {
                format!("(data->>'{}')::timestamptz", sort.field)
            } else {
                format!("data->'{}'", sort.field)
            };
            Ok(format!(
                " ORDER BY {} {} {}, key ASC",
                expression,
                sort.order.as_sql(),
                nulls
            ))
        }
        None => Ok(" ORDER BY key ASC".to_string()),
    }
}

/// `UPDATE` guarded by `predicate`; key and data bind after its parameters
fn conditional_update_sql(table_name: &str, predicate: &SqlPredicate) -> String {
    let key_param = predicate.params.len() + 1;
    format!(
        "UPDATE {} SET data = ${}, updated_at = NOW() WHERE key = ${} AND {}",
        table_name,
        key_param + 1,
        key_param,
        predicate.sql
    )
}

/// PostgreSQL storage implementation with connection pooling
///
/// Stores entities as JSONB in a table with (key, data) columns.
pub struct PostgresStorage<E>
where
    E: StorageEntity,
{
    pool: PgPool,
    table_name: String,
    _phantom: PhantomData<E>,
}

impl<E> Debug for PostgresStorage<E>
where
    E: StorageEntity,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStorage")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl<E> PostgresStorage<E>
where
    E: StorageEntity,
{
    /// Creates a new PostgreSQL storage with the given pool and table name
    pub fn new(pool: PgPool, table_name: impl Into<String>) -> Result<Self, DomainError> {
        let table_name = table_name.into();
        validate_field_name(&table_name)?;

        Ok(Self {
            pool,
            table_name,
            _phantom: PhantomData,
        })
    }

    /// Ensures the storage table exists
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                key VARCHAR(255) PRIMARY KEY,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.table_name
        );

        sqlx::query(&query)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        Ok(())
    }

    fn decode_rows(rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<E>, DomainError> {
        let mut entities = Vec::with_capacity(rows.len());

        for row in rows {
            let data: serde_json::Value = row.get("data");
            let entity: E = serde_json::from_value(data).map_err(|e| {
                DomainError::storage(format!("Failed to deserialize entity: {}", e))
            })?;
            entities.push(entity);
        }

        Ok(entities)
    }
}

#[async_trait]
impl<E> Storage<E> for PostgresStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let query = format!("SELECT data FROM {} WHERE key = $1", self.table_name);

        let result = sqlx::query(&query)
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get entity: {}", e)))?;

        match result {
            Some(row) => {
                let data: serde_json::Value = row.get("data");
                let entity: E = serde_json::from_value(data).map_err(|e| {
                    DomainError::storage(format!("Failed to deserialize entity: {}", e))
                })?;
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let query = format!("SELECT data FROM {} ORDER BY created_at", self.table_name);

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list entities: {}", e)))?;

        Self::decode_rows(rows)
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let data = serde_json::to_value(&entity).map_err(|e| {
            DomainError::storage(format!("Failed to serialize entity: {}", e))
        })?;

        let query = format!(
            "INSERT INTO {} (key, data) VALUES ($1, $2)",
            self.table_name
        );

        sqlx::query(&query)
            .bind(&key)
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if e.to_string().contains("duplicate key") {
                    DomainError::conflict(format!("Entity with key '{}' already exists", key))
                } else {
                    DomainError::storage(format!("Failed to create entity: {}", e))
                }
            })?;

        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let data = serde_json::to_value(&entity).map_err(|e| {
            DomainError::storage(format!("Failed to serialize entity: {}", e))
        })?;

        let query = format!(
            "UPDATE {} SET data = $2, updated_at = NOW() WHERE key = $1",
            self.table_name
        );

        let result = sqlx::query(&query)
            .bind(&key)
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update entity: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Entity with key '{}' not found",
                key
            )));
        }

        Ok(entity)
    }

    async fn update_if(&self, entity: E, expected: &Filter) -> Result<bool, DomainError> {
        let key = entity.key().as_str().to_string();
        let data = serde_json::to_value(&entity).map_err(|e| {
            DomainError::storage(format!("Failed to serialize entity: {}", e))
        })?;

        let predicate = build_predicate(expected)?;
        let sql = conditional_update_sql(&self.table_name, &predicate);

        let mut statement = sqlx::query(&sql);
        for param in &predicate.params {
            statement = statement.bind(param);
        }

        let result = statement
            .bind(&key)
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update entity: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        let query = format!("DELETE FROM {} WHERE key = $1", self.table_name);

        let result = sqlx::query(&query)
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete entity: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE key = $1) as exists",
            self.table_name
        );

        let row = sqlx::query(&query)
            .bind(key.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check existence: {}", e)))?;

        Ok(row.get("exists"))
    }

    async fn find(&self, query: &StorageQuery) -> Result<Vec<E>, DomainError> {
        let predicate = build_predicate(&query.filter)?;
        let mut sql = format!(
            "SELECT data FROM {} WHERE {}{}",
            self.table_name,
            predicate.sql,
            order_clause(query, E::TIMESTAMP_FIELDS)?
        );

        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if query.offset > 0 {
            sql.push_str(&format!(" OFFSET {}", query.offset));
        }

        let mut statement = sqlx::query(&sql);
        for param in &predicate.params {
            statement = statement.bind(param);
        }

        let rows = statement
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to query entities: {}", e)))?;

        Self::decode_rows(rows)
    }

    async fn count_where(&self, filter: &Filter) -> Result<usize, DomainError> {
        let predicate = build_predicate(filter)?;
        let sql = format!(
            "SELECT COUNT(*) as count FROM {} WHERE {}",
            self.table_name, predicate.sql
        );

        let mut statement = sqlx::query(&sql);
        for param in &predicate.params {
            statement = statement.bind(param);
        }

        let row = statement
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count entities: {}", e)))?;

        let count: i64 = row.get("count");
        Ok(count as usize)
    }
}
