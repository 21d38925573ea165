//! One-shot hybrid encryption: AES-256-GCM payload, RSA-OAEP wrapped key.
//!
//! Envelope fields (all base64):
//! - `encryptedKey`: RSA-OAEP(SHA-256, MGF1-SHA-256) of the 32-byte AES key
//! - `iv`: the 12-byte GCM nonce
//! - `data`: ciphertext || 16-byte tag

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::Oaep;
use sealdrop_types::EncryptedEnvelope;
use sha2::Sha256;
use tracing::{debug, error};
use zeroize::Zeroizing;

use super::keys::{RecipientPrivateKey, RecipientPublicKey};
use super::{CryptoError, CryptoResult};

/// Size of the one-time AES-256 key
pub const SESSION_KEY_LEN: usize = 32;
/// Size of the AES-GCM nonce
pub const NONCE_LEN: usize = 12;
/// Size of the AES-GCM authentication tag
pub const TAG_LEN: usize = 16;

fn oaep() -> Oaep {
    Oaep::new::<Sha256>()
}

/// Encrypt `plaintext` for the holder of the private half of `recipient_public_key_pem`.
///
/// Fresh key material is drawn from the OS RNG on every call, so encrypting
/// the same input twice never yields the same envelope.
pub fn encrypt(plaintext: &[u8], recipient_public_key_pem: &str) -> CryptoResult<EncryptedEnvelope> {
    RecipientPublicKey::from_pem(recipient_public_key_pem)
        .and_then(|recipient| seal(plaintext, &recipient))
        .map_err(|e| {
            error!(error = %e, "Encryption failed");
            e
        })
}

/// Encrypt `plaintext` under an already parsed recipient key.
pub fn seal(plaintext: &[u8], recipient: &RecipientPublicKey) -> CryptoResult<EncryptedEnvelope> {
    let mut session_key = Zeroizing::new([0u8; SESSION_KEY_LEN]);
    OsRng.fill_bytes(&mut session_key[..]);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(&session_key[..])
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    // aes-gcm appends the tag, which is exactly the `data` layout
    let data = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let encrypted_key = recipient
        .as_rsa()
        .encrypt(&mut OsRng, oaep(), &session_key[..])
        .map_err(|e| CryptoError::Encryption(format!("key wrap failed: {e}")))?;

    debug!(
        plaintext_len = plaintext.len(),
        modulus_len = recipient.modulus_len(),
        "Sealed payload"
    );

    Ok(EncryptedEnvelope {
        encrypted_key: BASE64.encode(encrypted_key),
        iv: BASE64.encode(nonce_bytes),
        data: BASE64.encode(data),
    })
}

/// Decrypt an envelope with the recipient's private key.
pub fn open(envelope: &EncryptedEnvelope, recipient: &RecipientPrivateKey) -> CryptoResult<Vec<u8>> {
    let wrapped_key = BASE64.decode(&envelope.encrypted_key)?;
    let nonce_bytes = BASE64.decode(&envelope.iv)?;
    let data = BASE64.decode(&envelope.data)?;

    if nonce_bytes.len() != NONCE_LEN {
        return Err(CryptoError::InvalidEnvelope(format!(
            "iv must be {NONCE_LEN} bytes, got {}",
            nonce_bytes.len()
        )));
    }
    if data.len() < TAG_LEN {
        return Err(CryptoError::InvalidEnvelope(format!(
            "data shorter than the {TAG_LEN}-byte tag: {} bytes",
            data.len()
        )));
    }

    let session_key = Zeroizing::new(
        recipient
            .as_rsa()
            .decrypt(oaep(), &wrapped_key)
            .map_err(|e| CryptoError::Decryption(format!("key unwrap failed: {e}")))?,
    );
    if session_key.len() != SESSION_KEY_LEN {
        return Err(CryptoError::InvalidEnvelope(format!(
            "wrapped key must be {SESSION_KEY_LEN} bytes, got {}",
            session_key.len()
        )));
    }

    let cipher = Aes256Gcm::new_from_slice(&session_key)
        .map_err(|e| CryptoError::Decryption(e.to_string()))?;

    // Tag is the trailing TAG_LEN bytes of `data`; aes-gcm splits it itself
    cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), data.as_slice())
        .map_err(|_| CryptoError::Decryption("authentication failed".into()))
}
