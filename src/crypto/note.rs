//! Receiver-side decoding of a full upload request.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sealdrop_types::{PayloadKind, UploadRequest};

use super::hybrid::open;
use super::keys::RecipientPrivateKey;
use super::{CryptoError, CryptoResult};

/// Plaintext recovered from an upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptedNote {
    Text(String),
    /// Raw recording bytes, with the inner base64 layer already removed
    Audio(Vec<u8>),
}

impl DecryptedNote {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Text(_) => PayloadKind::Text,
            Self::Audio(_) => PayloadKind::Audio,
        }
    }
}

/// Decrypt an upload request and undo the sender's per-type plaintext encoding.
///
/// Audio is base64-encoded by the sender before encryption, so the decrypted
/// bytes are base64 text that must be decoded once more.
pub fn open_upload(request: &UploadRequest, recipient: &RecipientPrivateKey) -> CryptoResult<DecryptedNote> {
    let plaintext = open(&request.payload, recipient)?;
    match request.kind {
        PayloadKind::Text => String::from_utf8(plaintext)
            .map(DecryptedNote::Text)
            .map_err(|e| CryptoError::InvalidEnvelope(format!("text payload is not UTF-8: {e}"))),
        PayloadKind::Audio => Ok(DecryptedNote::Audio(BASE64.decode(plaintext)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::encrypt;
    use crate::crypto::test_keys::keypair;

    fn private_key() -> RecipientPrivateKey {
        RecipientPrivateKey::from(keypair().0.clone())
    }

    #[test]
    fn test_open_text_note() {
        let (_, pem) = keypair();
        let envelope = encrypt("grüße".as_bytes(), pem).unwrap();
        let request = UploadRequest::new(PayloadKind::Text, envelope, "t");

        let note = open_upload(&request, &private_key()).unwrap();
        assert_eq!(note, DecryptedNote::Text("grüße".to_string()));
        assert_eq!(note.kind(), PayloadKind::Text);
    }

    #[test]
    fn test_open_audio_note_strips_inner_base64() {
        let (_, pem) = keypair();
        let recording = vec![0u8, 159, 146, 150, 255, 1, 2];
        let inner = BASE64.encode(&recording);
        let envelope = encrypt(inner.as_bytes(), pem).unwrap();
        let request = UploadRequest::new(PayloadKind::Audio, envelope, "t");

        let note = open_upload(&request, &private_key()).unwrap();
        assert_eq!(note, DecryptedNote::Audio(recording));
    }

    #[test]
    fn test_audio_without_inner_base64_is_rejected() {
        let (_, pem) = keypair();
        let envelope = encrypt(b"\x00\x01 not base64 \xff", pem).unwrap();
        let request = UploadRequest::new(PayloadKind::Audio, envelope, "t");

        let err = open_upload(&request, &private_key()).unwrap_err();
        assert!(matches!(err, CryptoError::Base64(_)));
    }

    #[test]
    fn test_text_must_be_utf8() {
        let (_, pem) = keypair();
        let envelope = encrypt(&[0xff, 0xfe, 0xfd], pem).unwrap();
        let request = UploadRequest::new(PayloadKind::Text, envelope, "t");

        let err = open_upload(&request, &private_key()).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidEnvelope(_)));
    }
}
