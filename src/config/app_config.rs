use serde::Deserialize;

use crate::domain::pagination::{PageLimits, DEFAULT_MAX_PAGE_LIMIT, DEFAULT_PAGE_LIMIT};
use crate::infrastructure::activity::DEFAULT_QUEUE_CAPACITY;
use crate::infrastructure::api_key::{DEFAULT_KEY_PREFIX, LEGACY_KEY_PREFIXES};
use crate::infrastructure::crypto::DEFAULT_KDF_ITERATIONS;
use crate::infrastructure::storage::{PostgresConfig, StorageConfig, StorageType};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageSettings,
    pub security: SecurityConfig,
    pub pagination: PaginationConfig,
    pub activity: ActivityConfig,
    pub metrics: MetricsConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Persistence backend selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory` or `postgres`
    pub backend: String,
    pub postgres_url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub encryption: EncryptionConfig,
    pub api_keys: ApiKeyConfig,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    /// Master key for credential encryption; no default
    pub master_key: Option<String>,
    pub kdf_iterations: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiKeyConfig {
    /// Scheme prefix for newly generated keys
    pub prefix: String,
    /// Additional prefixes still accepted on authentication
    pub accepted_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    pub enabled: bool,
    /// Also audit GET requests
    pub log_reads: bool,
    pub queue_capacity: usize,
}

/// Prometheus exporter
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Scrape endpoint, served outside the `/api` tree
    pub path: String,
}

/// First-run admin account, created only while no users exist
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub enabled: bool,
    pub admin_username: String,
    pub admin_email: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            postgres_url: None,
            max_connections: PostgresConfig::default().max_connections,
        }
    }
}

impl StorageSettings {
    /// Resolve the backend, failing on unknown names or a missing URL
    pub fn to_storage_config(&self) -> Result<StorageConfig, String> {
        match StorageType::parse(&self.backend) {
            Some(StorageType::InMemory) => Ok(StorageConfig::InMemory),
            Some(StorageType::Postgres) => {
                let url = self
                    .postgres_url
                    .as_deref()
                    .filter(|url| !url.is_empty())
                    .ok_or("storage.postgres_url is required for the postgres backend")?;

                Ok(StorageConfig::Postgres(
                    PostgresConfig::new(url).with_max_connections(self.max_connections),
                ))
            }
            None => Err(format!("Unknown storage backend '{}'", self.backend)),
        }
    }
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            master_key: None,
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

impl std::fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("master_key", &self.master_key.as_ref().map(|_| "[REDACTED]"))
            .field("kdf_iterations", &self.kdf_iterations)
            .finish()
    }
}

impl Default for ApiKeyConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            accepted_prefixes: LEGACY_KEY_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: DEFAULT_MAX_PAGE_LIMIT,
        }
    }
}

impl PaginationConfig {
    pub fn limits(&self) -> PageLimits {
        PageLimits::new(self.default_limit, self.max_limit)
    }
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_reads: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_username: "admin".to_string(),
            admin_email: "admin@forgekit.local".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.api_keys.accepted_prefixes")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
