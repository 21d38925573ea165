//! Assembly of the upload request body.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, SecondsFormat, Utc};
use sealdrop_types::{EncryptedEnvelope, PayloadKind, UploadRequest};

/// Encryption input for a recording.
///
/// Recordings are base64-encoded *before* encryption while text is encrypted
/// as raw UTF-8. Existing decryptors undo exactly this layering, so it must
/// not change.
pub fn audio_plaintext(recording: &[u8]) -> Vec<u8> {
    BASE64.encode(recording).into_bytes()
}

/// UTC timestamp with millisecond precision and a `Z` suffix.
pub fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn build_request(kind: PayloadKind, envelope: EncryptedEnvelope, now: DateTime<Utc>) -> UploadRequest {
    UploadRequest::new(kind, envelope, iso_timestamp(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn envelope() -> EncryptedEnvelope {
        EncryptedEnvelope {
            encrypted_key: "key".to_string(),
            iv: "iv".to_string(),
            data: "data".to_string(),
        }
    }

    #[test]
    fn test_timestamp_format() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 9, 30, 5).unwrap();
        assert_eq!(iso_timestamp(now), "2026-10-15T09:30:05.000Z");
    }

    #[test]
    fn test_audio_plaintext_is_base64_text() {
        assert_eq!(audio_plaintext(b"audio"), b"YXVkaW8=".to_vec());
        assert_eq!(audio_plaintext(&[]), Vec::<u8>::new());
    }

    #[test]
    fn test_text_body_shape() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let body = serde_json::to_value(build_request(PayloadKind::Text, envelope(), now)).unwrap();

        assert_eq!(body["type"], "text");
        assert_eq!(body["payload"]["encryptedKey"], "key");
        assert_eq!(body["timestamp"], "2026-01-02T03:04:05.000Z");
        assert!(body.get("encoding").is_none());
    }

    #[test]
    fn test_audio_body_shape() {
        let body = serde_json::to_value(build_request(PayloadKind::Audio, envelope(), Utc::now())).unwrap();
        assert_eq!(body["type"], "audio");
        assert_eq!(body["encoding"], "base64");
    }
}
