//! Application state shared by every handler

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::storage::Storage;
use crate::domain::user::User;
use crate::infrastructure::activity::ActivityLogger;
use crate::infrastructure::api_key::ApiKeyService;
use crate::infrastructure::content::ContentService;
use crate::infrastructure::credentials::CredentialService;
use crate::infrastructure::crypto::SecretCipher;
use crate::infrastructure::storage::StorageFactory;
use crate::infrastructure::team::TeamService;

/// Services are cheap to clone; each holds `Arc`s to its stores.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: StorageFactory,
    pub users: Arc<dyn Storage<User>>,
    pub cipher: Arc<SecretCipher>,
    pub api_key_service: ApiKeyService,
    pub credential_service: CredentialService,
    pub content_service: ContentService,
    pub team_service: TeamService,
    pub activity_logger: ActivityLogger,
}
