//! Layered application configuration

mod app_config;

pub use app_config::{
    ActivityConfig, ApiKeyConfig, AppConfig, BootstrapConfig, EncryptionConfig, LogFormat,
    LoggingConfig, MetricsConfig, PaginationConfig, SecurityConfig, ServerConfig, StorageSettings,
};
