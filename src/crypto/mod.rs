//! Hybrid encryption for sealed uploads.
//!
//! Uses:
//! - AES-256-GCM with a one-time key and nonce for the payload
//! - RSA-OAEP (SHA-256 hash and MGF1) to wrap the one-time key
//!
//! The sending side only ever loads the recipient's public key. Opening an
//! envelope is provided for the receiving side and for local decryption of
//! captured uploads.

pub mod hybrid;
pub mod keys;
pub mod note;

pub use hybrid::{encrypt, open, seal, NONCE_LEN, SESSION_KEY_LEN, TAG_LEN};
pub use keys::{RecipientPrivateKey, RecipientPublicKey};
pub use note::{open_upload, DecryptedNote};

use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid recipient key: {0}")]
    KeyParse(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Invalid base64 encoding: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Result type for crypto operations
pub type CryptoResult<T> = Result<T, CryptoError>;
