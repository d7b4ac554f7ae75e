//! Stored provider credential
//!
//! The secret itself is only ever held as the opaque blob produced by the
//! secret cipher; `key_prefix` is a short display hint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::storage::{OwnedEntity, StorageEntity};
use crate::domain::user::UserId;
use crate::domain::DomainError;

crate::uuid_identifier!(
    /// Unique identifier for a stored credential
    CredentialId,
    "Credential ID"
);

const MAX_SERVICE_LENGTH: usize = 50;
const MAX_NAME_LENGTH: usize = 100;

/// Validate a provider service identifier (`openai`, `elevenlabs`, `meshy`, ...)
pub fn validate_service(service: &str) -> Result<(), DomainError> {
    if service.is_empty() {
        return Err(DomainError::validation("Service cannot be empty"));
    }

    if service.len() > MAX_SERVICE_LENGTH {
        return Err(DomainError::validation(format!(
            "Service cannot exceed {} characters",
            MAX_SERVICE_LENGTH
        )));
    }

    if !service
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(DomainError::validation(
            "Service can only contain lowercase letters, digits, hyphens, and underscores",
        ));
    }

    Ok(())
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("Credential name cannot be empty"));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(DomainError::validation(format!(
            "Credential name cannot exceed {} characters",
            MAX_NAME_LENGTH
        )));
    }

    Ok(())
}

/// A third-party provider secret owned by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    id: CredentialId,
    owner_id: UserId,
    service: String,
    name: String,
    encrypted_secret: String,
    key_prefix: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoredCredential {
    /// Create a new stored credential from an already encrypted secret
    pub fn new(
        owner_id: UserId,
        service: impl Into<String>,
        name: impl Into<String>,
        encrypted_secret: impl Into<String>,
        key_prefix: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let service = service.into();
        let name = name.into();
        validate_service(&service)?;
        validate_name(&name)?;

        let now = Utc::now();
        Ok(Self {
            id: CredentialId::generate(),
            owner_id,
            service,
            name,
            encrypted_secret: encrypted_secret.into(),
            key_prefix: key_prefix.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    // Getters
    pub fn id(&self) -> &CredentialId {
        &self.id
    }

    pub fn owner(&self) -> &UserId {
        &self.owner_id
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn encrypted_secret(&self) -> &str {
        &self.encrypted_secret
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replace the secret with a newly encrypted one
    pub fn replace_secret(
        &mut self,
        encrypted_secret: impl Into<String>,
        key_prefix: impl Into<String>,
    ) {
        self.encrypted_secret = encrypted_secret.into();
        self.key_prefix = key_prefix.into();
        self.updated_at = Utc::now();
    }

    /// Update mutable metadata
    pub fn update(&mut self, name: Option<String>, is_active: Option<bool>) -> Result<(), DomainError> {
        if let Some(n) = name {
            validate_name(&n)?;
            self.name = n;
        }

        if let Some(active) = is_active {
            self.is_active = active;
        }

        self.updated_at = Utc::now();
        Ok(())
    }
}

impl StorageEntity for StoredCredential {
    type Key = CredentialId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl OwnedEntity for StoredCredential {
    const RESOURCE_NAME: &'static str = "Credential";

    fn owner_id(&self) -> &str {
        self.owner_id.as_str()
    }
}

/// Client-facing view of a credential; never carries the ciphertext
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialSummary {
    pub id: String,
    pub owner_id: String,
    pub service: String,
    pub name: String,
    pub key_prefix: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&StoredCredential> for CredentialSummary {
    fn from(c: &StoredCredential) -> Self {
        Self {
            id: c.id.to_string(),
            owner_id: c.owner_id.to_string(),
            service: c.service.clone(),
            name: c.name.clone(),
            key_prefix: c.key_prefix.clone(),
            is_active: c.is_active,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_credential() -> StoredCredential {
        StoredCredential::new(
            UserId::generate(),
            "elevenlabs",
            "Voice production",
            "b64-blob",
            "sk_1****",
        )
        .unwrap()
    }

    #[test]
    fn test_service_validation() {
        assert!(validate_service("openai").is_ok());
        assert!(validate_service("stable_diffusion-xl").is_ok());
        assert!(validate_service("").is_err());
        assert!(validate_service("OpenAI").is_err());
        assert!(validate_service(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_stored_credential_creation() {
        let cred = create_test_credential();

        assert_eq!(cred.service(), "elevenlabs");
        assert_eq!(cred.name(), "Voice production");
        assert_eq!(cred.encrypted_secret(), "b64-blob");
        assert!(cred.is_active());
        assert_eq!(cred.owner_id(), cred.owner().as_str());
    }

    #[test]
    fn test_stored_credential_update() {
        let mut cred = create_test_credential();

        cred.update(Some("Renamed".to_string()), Some(false)).unwrap();
        assert_eq!(cred.name(), "Renamed");
        assert!(!cred.is_active());

        assert!(cred.update(Some(" ".to_string()), None).is_err());
    }

    #[test]
    fn test_replace_secret() {
        let mut cred = create_test_credential();
        cred.replace_secret("other-blob", "sk_2****");

        assert_eq!(cred.encrypted_secret(), "other-blob");
        assert_eq!(cred.key_prefix(), "sk_2****");
    }

    #[test]
    fn test_summary_omits_ciphertext() {
        let cred = create_test_credential();
        let json = serde_json::to_string(&CredentialSummary::from(&cred)).unwrap();

        assert!(!json.contains("encrypted_secret"));
        assert!(!json.contains("b64-blob"));
    }
}
