//! Credential service for managing encrypted provider secrets

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::domain::access::Principal;
use crate::domain::credentials::{CredentialId, CredentialSummary, StoredCredential};
use crate::domain::pagination::{ListSpec, PageLimits, Paginated, PaginationQuery};
use crate::domain::storage::{Filter, Storage};
use crate::domain::DomainError;
use crate::infrastructure::access::{verify_ownership, verify_ownership_or_admin};
use crate::infrastructure::crypto::{mask_secret, SecretCipher};
use crate::infrastructure::pagination::paginate;

const CREDENTIAL_SEARCH_FIELDS: &[&str] = &["name", "service"];
const CREDENTIAL_SORT_FIELDS: &[&str] = &["name", "service", "created_at", "updated_at"];

/// Request to store a new credential
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCredentialRequest {
    pub service: String,
    pub name: String,
    /// Plaintext secret; encrypted before it reaches storage
    pub secret: String,
}

/// Request to update a credential
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCredentialRequest {
    pub name: Option<String>,
    /// Replacement secret
    pub secret: Option<String>,
    pub is_active: Option<bool>,
}

/// Service for managing stored credentials
#[derive(Debug, Clone)]
pub struct CredentialService {
    store: Arc<dyn Storage<StoredCredential>>,
    cipher: Arc<SecretCipher>,
    page_limits: PageLimits,
}

impl CredentialService {
    pub fn new(store: Arc<dyn Storage<StoredCredential>>, cipher: Arc<SecretCipher>) -> Self {
        Self {
            store,
            cipher,
            page_limits: PageLimits::default(),
        }
    }

    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.page_limits = limits;
        self
    }

    /// Encrypt and store a new credential for the calling user
    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateCredentialRequest,
    ) -> Result<CredentialSummary, DomainError> {
        let secret = request.secret.trim();
        let encrypted = self.cipher.encrypt(secret)?;

        let credential = StoredCredential::new(
            principal.user_id.clone(),
            request.service,
            request.name,
            encrypted,
            mask_secret(secret),
        )?;

        let created = self.store.create(credential).await?;

        info!(
            credential_id = %created.id(),
            service = %created.service(),
            owner_id = %principal.user_id,
            "Credential created"
        );

        Ok(CredentialSummary::from(&created))
    }

    /// Paginated listing; roles without the ownership bypass only see their own
    pub async fn list(
        &self,
        principal: &Principal,
        query: &PaginationQuery,
        service: Option<&str>,
    ) -> Result<Paginated<CredentialSummary>, DomainError> {
        let mut filter = if principal.bypasses_ownership() {
            Filter::All
        } else {
            Filter::eq("owner_id", principal.user_id.as_str())
        };

        if let Some(service) = service {
            filter = filter.and(Filter::eq("service", service));
        }

        let spec = ListSpec::new(CREDENTIAL_SEARCH_FIELDS, CREDENTIAL_SORT_FIELDS, "created_at")
            .with_limits(self.page_limits);

        let page = paginate(self.store.as_ref(), query, &spec, filter).await?;

        Ok(page.map(|credential| CredentialSummary::from(&credential)))
    }

    pub async fn get(
        &self,
        id: &CredentialId,
        principal: &Principal,
    ) -> Result<CredentialSummary, DomainError> {
        let credential = verify_ownership_or_admin(self.store.as_ref(), id, principal).await?;
        Ok(CredentialSummary::from(&credential))
    }

    /// Rename, toggle or rotate the secret of a credential
    pub async fn update(
        &self,
        id: &CredentialId,
        principal: &Principal,
        request: UpdateCredentialRequest,
    ) -> Result<CredentialSummary, DomainError> {
        let mut credential = verify_ownership_or_admin(self.store.as_ref(), id, principal).await?;

        credential.update(request.name, request.is_active)?;

        let rotated = request.secret.is_some();
        if let Some(secret) = request.secret {
            let secret = secret.trim();
            credential.replace_secret(self.cipher.encrypt(secret)?, mask_secret(secret));
        }

        let updated = self.store.update(credential).await?;

        info!(
            credential_id = %id,
            user_id = %principal.user_id,
            secret_rotated = rotated,
            "Credential updated"
        );

        Ok(CredentialSummary::from(&updated))
    }

    pub async fn delete(&self, id: &CredentialId, principal: &Principal) -> Result<(), DomainError> {
        verify_ownership_or_admin(self.store.as_ref(), id, principal).await?;

        if !self.store.delete(id).await? {
            return Err(DomainError::not_found(format!("Credential '{}' not found", id)));
        }

        info!(credential_id = %id, user_id = %principal.user_id, "Credential deleted");
        Ok(())
    }

    /// Decrypt a credential's secret
    ///
    /// Only the owning user may reveal; the admin bypass does not apply and
    /// foreign credentials are reported as missing.
    pub async fn reveal(
        &self,
        id: &CredentialId,
        principal: &Principal,
    ) -> Result<String, DomainError> {
        let credential = verify_ownership(self.store.as_ref(), id, &principal.user_id).await?;

        if !credential.is_active() {
            return Err(DomainError::conflict(format!(
                "Credential '{}' is inactive",
                id
            )));
        }

        let secret = self.cipher.decrypt(credential.encrypted_secret())?;

        info!(credential_id = %id, user_id = %principal.user_id, "Credential revealed");
        Ok(secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{UserId, UserRole};
    use crate::infrastructure::crypto::MIN_KDF_ITERATIONS;
    use crate::infrastructure::storage::InMemoryStorage;

    struct Fixture {
        service: CredentialService,
        store: Arc<InMemoryStorage<StoredCredential>>,
        alice: Principal,
        bob: Principal,
        admin: Principal,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStorage::<StoredCredential>::new());
        let cipher =
            SecretCipher::new(Some("credential-test-key".to_string()), MIN_KDF_ITERATIONS).unwrap();

        Fixture {
            service: CredentialService::new(store.clone(), Arc::new(cipher)),
            store,
            alice: Principal::new(UserId::generate(), UserRole::Member),
            bob: Principal::new(UserId::generate(), UserRole::Member),
            admin: Principal::new(UserId::generate(), UserRole::Admin),
        }
    }

    fn request(secret: &str) -> CreateCredentialRequest {
        CreateCredentialRequest {
            service: "openai".to_string(),
            name: "Production".to_string(),
            secret: secret.to_string(),
        }
    }

    #[tokio::test]
    async fn test_secret_is_encrypted_at_rest() {
        let f = fixture();
        let summary = f.service.create(&f.alice, request("sk-proj-abcdef123456")).await.unwrap();
        assert_eq!(summary.key_prefix, "sk-p****");

        let stored = f.store.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].encrypted_secret().contains("abcdef123456"));

        let id = CredentialId::new(&summary.id).unwrap();
        let secret = f.service.reveal(&id, &f.alice).await.unwrap();
        assert_eq!(secret, "sk-proj-abcdef123456");
    }

    #[tokio::test]
    async fn test_reveal_hides_foreign_credentials() {
        let f = fixture();
        let summary = f.service.create(&f.alice, request("sk-proj-abcdef123456")).await.unwrap();
        let id = CredentialId::new(&summary.id).unwrap();

        assert!(f.service.reveal(&id, &f.bob).await.unwrap_err().is_not_found());
        assert!(f.service.reveal(&id, &f.admin).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_rotate_secret() {
        let f = fixture();
        let summary = f.service.create(&f.alice, request("sk-old-secret-value")).await.unwrap();
        let id = CredentialId::new(&summary.id).unwrap();

        let update = UpdateCredentialRequest {
            secret: Some("sk-new-secret-value".to_string()),
            ..Default::default()
        };
        let updated = f.service.update(&id, &f.alice, update).await.unwrap();
        assert_eq!(updated.key_prefix, "sk-n****");

        assert_eq!(f.service.reveal(&id, &f.alice).await.unwrap(), "sk-new-secret-value");
    }

    #[tokio::test]
    async fn test_update_and_delete_checks_access() {
        let f = fixture();
        let summary = f.service.create(&f.alice, request("sk-proj-abcdef123456")).await.unwrap();
        let id = CredentialId::new(&summary.id).unwrap();

        let err = f
            .service
            .update(&id, &f.bob, UpdateCredentialRequest::default())
            .await
            .unwrap_err();
        assert!(err.is_forbidden());
        assert!(f.service.delete(&id, &f.bob).await.unwrap_err().is_forbidden());

        // Admin bypass applies to management, not to reveal
        f.service.delete(&id, &f.admin).await.unwrap();
        assert!(f.service.get(&id, &f.alice).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_inactive_credential_cannot_be_revealed() {
        let f = fixture();
        let summary = f.service.create(&f.alice, request("sk-proj-abcdef123456")).await.unwrap();
        let id = CredentialId::new(&summary.id).unwrap();

        let update = UpdateCredentialRequest {
            is_active: Some(false),
            ..Default::default()
        };
        f.service.update(&id, &f.alice, update).await.unwrap();

        let err = f.service.reveal(&id, &f.alice).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped() {
        let f = fixture();
        f.service.create(&f.alice, request("sk-alice-secret-1")).await.unwrap();
        f.service.create(&f.bob, request("sk-bob-secret-1")).await.unwrap();

        let alice = f.service.list(&f.alice, &PaginationQuery::default(), None).await.unwrap();
        assert_eq!(alice.pagination.total, 1);
        assert_eq!(alice.data[0].owner_id, f.alice.user_id.as_str());

        let all = f.service.list(&f.admin, &PaginationQuery::default(), None).await.unwrap();
        assert_eq!(all.pagination.total, 2);

        let json = serde_json::to_string(&all).unwrap();
        assert!(!json.contains("encrypted_secret"));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_secret_and_bad_service() {
        let f = fixture();

        assert!(f.service.create(&f.alice, request("   ")).await.is_err());

        let bad = CreateCredentialRequest {
            service: "Open AI!".to_string(),
            ..request("sk-proj-abcdef123456")
        };
        assert!(f.service.create(&f.alice, bad).await.is_err());
        assert!(f.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_master_key() {
        let store = Arc::new(InMemoryStorage::<StoredCredential>::new());
        let cipher = SecretCipher::new(None, MIN_KDF_ITERATIONS).unwrap();
        let service = CredentialService::new(store, Arc::new(cipher));
        let alice = Principal::new(UserId::generate(), UserRole::Member);

        let err = service.create(&alice, request("sk-proj-abcdef123456")).await.unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
    }
}
