//! Cryptographic helpers

mod cipher;

pub use cipher::{mask_secret, SecretCipher, DEFAULT_KDF_ITERATIONS, MIN_KDF_ITERATIONS};
