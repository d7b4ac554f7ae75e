//! Secret encryption at rest
//!
//! Blob layout: `base64(salt[32] ‖ iv[12] ‖ tag[16] ‖ ciphertext)`. Every call
//! draws a fresh salt and IV, and the AES-256-GCM key is derived from the
//! master key with PBKDF2-HMAC-SHA512 over that salt.

use aes_gcm::aead::AeadInPlace;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce, Tag};
use base64::{engine::general_purpose::STANDARD, Engine};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha512;

use crate::domain::DomainError;

pub const SALT_LEN: usize = 32;
pub const IV_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;
const HEADER_LEN: usize = SALT_LEN + IV_LEN + TAG_LEN;

pub const MIN_KDF_ITERATIONS: u32 = 100_000;
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

const MASK: &str = "****";
const MASK_VISIBLE_CHARS: usize = 4;
const MASK_MIN_LENGTH: usize = 8;

/// Authenticated encryption for small secrets (provider API keys)
#[derive(Clone)]
pub struct SecretCipher {
    master_key: Option<String>,
    iterations: u32,
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher")
            .field("master_key", &self.master_key.as_ref().map(|_| "[REDACTED]"))
            .field("iterations", &self.iterations)
            .finish()
    }
}

impl SecretCipher {
    /// Build a cipher; a missing or blank master key is accepted here and
    /// reported on first use.
    pub fn new(master_key: Option<String>, iterations: u32) -> Result<Self, DomainError> {
        if iterations < MIN_KDF_ITERATIONS {
            return Err(DomainError::configuration(format!(
                "KDF iterations must be at least {}, got {}",
                MIN_KDF_ITERATIONS, iterations
            )));
        }

        Ok(Self {
            master_key: master_key.filter(|k| !k.trim().is_empty()),
            iterations,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.master_key.is_some()
    }

    /// Encrypt a non-empty secret into an opaque base64 blob
    pub fn encrypt(&self, plaintext: &str) -> Result<String, DomainError> {
        if plaintext.is_empty() {
            return Err(DomainError::validation("Plaintext cannot be empty"));
        }

        let master_key = self.master_key()?;

        let mut salt = [0u8; SALT_LEN];
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut iv);

        let cipher = self.derive_cipher(master_key, &salt)?;

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut buffer)
            .map_err(|_| DomainError::internal("Encryption failed"))?;

        let mut blob = Vec::with_capacity(HEADER_LEN + buffer.len());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&iv);
        blob.extend_from_slice(&tag);
        blob.extend_from_slice(&buffer);

        Ok(STANDARD.encode(blob))
    }

    /// Decrypt a blob produced by [`encrypt`](Self::encrypt)
    ///
    /// Malformed input, a failed tag check, a wrong master key and non-UTF-8
    /// plaintext all produce the same `Decryption` error.
    pub fn decrypt(&self, blob: &str) -> Result<String, DomainError> {
        let master_key = self.master_key()?;

        let bytes = STANDARD
            .decode(blob.trim())
            .map_err(|_| DomainError::decryption())?;

        // At least one ciphertext byte: empty plaintexts are never encrypted
        if bytes.len() <= HEADER_LEN {
            return Err(DomainError::decryption());
        }

        let (salt, rest) = bytes.split_at(SALT_LEN);
        let (iv, rest) = rest.split_at(IV_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let cipher = self.derive_cipher(master_key, salt)?;

        let mut buffer = ciphertext.to_vec();
        cipher
            .decrypt_in_place_detached(Nonce::from_slice(iv), b"", &mut buffer, Tag::from_slice(tag))
            .map_err(|_| DomainError::decryption())?;

        String::from_utf8(buffer).map_err(|_| DomainError::decryption())
    }

    fn master_key(&self) -> Result<&str, DomainError> {
        self.master_key.as_deref().ok_or_else(|| {
            DomainError::configuration("Encryption master key is not configured")
        })
    }

    fn derive_cipher(&self, master_key: &str, salt: &[u8]) -> Result<Aes256Gcm, DomainError> {
        let mut key = [0u8; KEY_LEN];
        pbkdf2_hmac::<Sha512>(master_key.as_bytes(), salt, self.iterations, &mut key);

        Aes256Gcm::new_from_slice(&key).map_err(|_| DomainError::internal("Invalid derived key"))
    }
}

/// Non-secret display hint for a secret: first 4 characters then a mask
///
/// Secrets shorter than 8 characters are fully masked.
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() < MASK_MIN_LENGTH {
        return MASK.to_string();
    }

    let visible: String = secret.chars().take(MASK_VISIBLE_CHARS).collect();
    format!("{}{}", visible, MASK)
}
