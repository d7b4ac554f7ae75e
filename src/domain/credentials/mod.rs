//! Credential management domain

mod stored;

pub use stored::{validate_service, CredentialId, CredentialSummary, StoredCredential};
