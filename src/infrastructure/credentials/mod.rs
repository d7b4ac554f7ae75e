//! Provider credential management

mod service;

pub use service::{CreateCredentialRequest, CredentialService, UpdateCredentialRequest};
