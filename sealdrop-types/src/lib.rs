//! Wire types for sealed uploads.
//!
//! These are the JSON shapes exchanged between the sending client, the ingest
//! receiver and anything that later decrypts a stored upload. Field names and
//! ordering are part of the wire contract with existing decryptors.

use serde::{Deserialize, Serialize};

/// Header carrying the shared secret. Omitted entirely when no secret is configured.
pub const AUTH_SECRET_HEADER: &str = "X-Auth-Secret";

/// One hybrid-encrypted payload.
///
/// All three fields are standard base64 with padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedEnvelope {
    /// RSA-OAEP(SHA-256) wrapped 32-byte AES key
    pub encrypted_key: String,
    /// 12-byte AES-GCM nonce
    pub iv: String,
    /// AES-256-GCM ciphertext followed by the 16-byte tag
    pub data: String,
}

/// What the sealed payload contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    Text,
    Audio,
}

impl PayloadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Audio => "audio",
        }
    }
}

/// Hint describing how the decrypted bytes are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    /// Decrypted bytes are base64 text wrapping the raw recording
    Base64,
}

/// Body of the upload POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    #[serde(rename = "type")]
    pub kind: PayloadKind,
    pub payload: EncryptedEnvelope,
    /// ISO-8601 UTC time the request was built
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<PayloadEncoding>,
}

impl UploadRequest {
    /// Build a request; audio always carries the base64 encoding hint, text never does.
    pub fn new(kind: PayloadKind, payload: EncryptedEnvelope, timestamp: impl Into<String>) -> Self {
        let encoding = match kind {
            PayloadKind::Audio => Some(PayloadEncoding::Base64),
            PayloadKind::Text => None,
        };
        Self {
            kind,
            payload,
            timestamp: timestamp.into(),
            encoding,
        }
    }
}

/// Acknowledgement returned by the ingest receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub status: String,
    pub id: String,
}

impl IngestReceipt {
    pub fn success(id: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            id: id.into(),
        }
    }
}
