//! ForgeKit admin API
//!
//! Credential and access-control backend for game-content production:
//! - Encrypted third-party credentials (AES-256-GCM, PBKDF2-derived keys)
//! - Hashed API keys for users and teams
//! - Ownership and team-membership checks on every resource
//! - An asynchronous audit trail fed by the HTTP layer

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{
    access::Principal, ActivityLogEntry, ApiKey, Asset, Project, StoredCredential, Team,
    TeamMembership, User, UserRole,
};
use infrastructure::{
    activity::ActivityLogger,
    api_key::{ApiKeyGenerator, ApiKeyService, CreateApiKey},
    content::ContentService,
    credentials::CredentialService,
    crypto::SecretCipher,
    storage::StorageFactory,
    team::TeamService,
};
use tracing::{info, warn};

/// Create the application state from configuration
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = config
        .storage
        .to_storage_config()
        .map_err(anyhow::Error::msg)?;

    info!("Storage backend: {:?}", storage_config.storage_type());
    let storage = StorageFactory::connect(&storage_config).await?;

    create_app_state_with_storage(config, storage).await
}

/// Create the application state on an already connected backend
pub async fn create_app_state_with_storage(
    config: &AppConfig,
    storage: StorageFactory,
) -> anyhow::Result<AppState> {
    if config.security.api_keys.prefix.trim().is_empty() {
        anyhow::bail!("security.api_keys.prefix must not be empty");
    }

    let users = storage.create::<User>("users").await?;
    let teams = storage.create::<Team>("teams").await?;
    let memberships = storage.create::<TeamMembership>("team_memberships").await?;
    let api_keys = storage.create::<ApiKey>("api_keys").await?;
    let credentials = storage.create::<StoredCredential>("credentials").await?;
    let projects = storage.create::<Project>("projects").await?;
    let assets = storage.create::<Asset>("assets").await?;
    let activity_logs = storage.create::<ActivityLogEntry>("activity_logs").await?;

    let encryption = &config.security.encryption;
    let cipher = Arc::new(SecretCipher::new(
        encryption.master_key.clone(),
        encryption.kdf_iterations,
    )?);
    if !cipher.is_configured() {
        warn!("No encryption master key configured; credential storage is disabled");
    }

    let page_limits = config.pagination.limits();

    let team_service = TeamService::new(teams, memberships, users.clone());

    let generator = ApiKeyGenerator::new(
        config.security.api_keys.prefix.clone(),
        &config.security.api_keys.accepted_prefixes,
    );
    let api_key_service =
        ApiKeyService::new(api_keys, users.clone(), team_service.access().clone())
            .with_generator(generator)
            .with_page_limits(page_limits);

    let credential_service =
        CredentialService::new(credentials, cipher.clone()).with_page_limits(page_limits);
    let content_service = ContentService::new(projects, assets).with_page_limits(page_limits);

    let activity_logger = if config.activity.enabled {
        let (logger, _worker) =
            ActivityLogger::start(activity_logs, config.activity.queue_capacity);
        logger
    } else {
        info!("Activity logging disabled");
        ActivityLogger::disabled(activity_logs)
    };
    let activity_logger = activity_logger.with_page_limits(page_limits);

    let state = AppState {
        config: Arc::new(config.clone()),
        storage,
        users,
        cipher,
        api_key_service,
        credential_service,
        content_service,
        team_service,
        activity_logger,
    };

    if config.bootstrap.enabled {
        create_initial_admin(&state).await?;
    }

    Ok(state)
}

/// Create an admin user and API key if no users exist
///
/// The key is printed once; only its hash is stored.
async fn create_initial_admin(state: &AppState) -> anyhow::Result<()> {
    if state.users.count().await? > 0 {
        return Ok(());
    }

    let bootstrap = &state.config.bootstrap;
    let admin = User::new(
        bootstrap.admin_username.clone(),
        bootstrap.admin_email.clone(),
        UserRole::Admin,
    )?;
    state.users.create(admin.clone()).await?;

    let principal = Principal::new(admin.id().clone(), UserRole::Admin);
    let created = state
        .api_key_service
        .create(
            &principal,
            CreateApiKey {
                name: "bootstrap".to_string(),
                ..Default::default()
            },
        )
        .await?;

    info!("===========================================");
    info!("Initial admin user created!");
    info!("Username: {}", admin.username());
    info!("API key: {}", created.key);
    info!("Store this key now; it cannot be shown again.");
    info!("===========================================");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.security.encryption.master_key = Some("lib-test-master-key".to_string());
        config
    }

    #[tokio::test]
    async fn test_initial_admin_is_created_once() {
        let config = config();
        let storage = StorageFactory::in_memory();

        let state = create_app_state_with_storage(&config, storage).await.unwrap();
        assert_eq!(state.users.count().await.unwrap(), 1);

        let admin = state.users.list().await.unwrap().remove(0);
        assert_eq!(admin.role(), UserRole::Admin);
        assert_eq!(admin.username(), "admin");

        create_initial_admin(&state).await.unwrap();
        assert_eq!(state.users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_can_be_disabled() {
        let mut config = config();
        config.bootstrap.enabled = false;

        let state = create_app_state_with_storage(&config, StorageFactory::in_memory())
            .await
            .unwrap();
        assert_eq!(state.users.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_key_prefix_is_rejected() {
        let mut config = config();
        config.security.api_keys.prefix = "  ".to_string();

        assert!(create_app_state_with_storage(&config, StorageFactory::in_memory())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_low_kdf_iterations_are_rejected() {
        let mut config = config();
        config.security.encryption.kdf_iterations = 1_000;

        assert!(create_app_state_with_storage(&config, StorageFactory::in_memory())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_missing_master_key_still_starts() {
        let mut config = config();
        config.security.encryption.master_key = None;

        let state = create_app_state_with_storage(&config, StorageFactory::in_memory())
            .await
            .unwrap();
        assert!(!state.cipher.is_configured());
    }
}
