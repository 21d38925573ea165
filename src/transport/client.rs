use crate::config::TransportConfig;
use crate::crypto;
use crate::error::{AppError, AppResult};
use crate::settings::ConfigStore;
use crate::transport::request::{audio_plaintext, build_request};
use chrono::Utc;
use rand::Rng;
use reqwest::{Client, Response};
use sealdrop_types::{PayloadKind, UploadRequest, AUTH_SECRET_HEADER};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Settings needed for one upload, read fresh on every call.
struct Destination {
    public_key: String,
    target_url: String,
    auth_secret: Option<String>,
}

/// Encrypts payloads and POSTs them to the configured endpoint.
#[derive(Clone)]
pub struct UploadClient {
    http: Client,
    store: ConfigStore,
    max_retries: u32,
}

impl std::fmt::Debug for UploadClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadClient")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl UploadClient {
    /// Create a client reading its destination from `store`.
    pub fn new(store: ConfigStore, config: &TransportConfig) -> AppResult<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            store,
            max_retries: config.max_retries,
        })
    }

    /// Encrypt and upload a text note.
    pub async fn upload_text(&self, text: &str) -> AppResult<Value> {
        let destination = self.destination().await?;
        self.deliver(PayloadKind::Text, text.as_bytes(), &destination)
            .await
    }

    /// Encrypt and upload a finished recording read from `path`.
    ///
    /// The file is only read; it stays owned by the caller.
    pub async fn upload_audio(&self, path: impl AsRef<Path>) -> AppResult<Value> {
        let destination = self.destination().await?;
        let path = path.as_ref();
        let recording = tokio::fs::read(path).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to read recording");
            AppError::Io(e)
        })?;
        self.deliver(PayloadKind::Audio, &audio_plaintext(&recording), &destination)
            .await
    }

    /// Encrypt and upload a recording already held in memory.
    pub async fn upload_audio_bytes(&self, recording: &[u8]) -> AppResult<Value> {
        let destination = self.destination().await?;
        self.deliver(PayloadKind::Audio, &audio_plaintext(recording), &destination)
            .await
    }

    /// Read the three settings; fails before any I/O if key or URL is missing.
    ///
    /// An empty string counts as missing, for the auth secret too.
    async fn destination(&self) -> AppResult<Destination> {
        let public_key = self.store.recipient_public_key().await.filter(|v| !v.is_empty());
        let target_url = self.store.target_url().await.filter(|v| !v.is_empty());
        let auth_secret = self.store.auth_secret().await.filter(|v| !v.is_empty());

        match (public_key, target_url) {
            (Some(public_key), Some(target_url)) => Ok(Destination {
                public_key,
                target_url,
                auth_secret,
            }),
            _ => {
                let err = AppError::missing_configuration();
                error!(error = %err, "Upload aborted");
                Err(err)
            }
        }
    }

    async fn deliver(
        &self,
        kind: PayloadKind,
        plaintext: &[u8],
        destination: &Destination,
    ) -> AppResult<Value> {
        let envelope = crypto::encrypt(plaintext, &destination.public_key)?;
        let request = build_request(kind, envelope, Utc::now());

        debug!(kind = kind.as_str(), url = %destination.target_url, "Uploading sealed payload");
        let response = self.post(&request, destination).await?;

        let status = response.status();
        if !status.is_success() {
            let status_text = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_str().to_string());
            error!(status = status.as_u16(), "Upload failed: {}", status_text);
            return Err(AppError::Upload {
                status: status.as_u16(),
                status_text,
            });
        }

        let body = response.json::<Value>().await.map_err(|e| {
            error!(error = %e, "Failed to parse upload response");
            AppError::InvalidResponse(e.to_string())
        })?;

        info!(kind = kind.as_str(), status = status.as_u16(), "Upload delivered");
        Ok(body)
    }

    /// Send the request; only connection failures and timeouts are retried.
    async fn post(&self, request: &UploadRequest, destination: &Destination) -> AppResult<Response> {
        let mut attempt = 0;

        loop {
            let mut builder = self.http.post(&destination.target_url).json(request);
            if let Some(secret) = &destination.auth_secret {
                builder = builder.header(AUTH_SECRET_HEADER, secret);
            }

            match builder.send().await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.max_retries && (e.is_connect() || e.is_timeout()) => {
                    attempt += 1;
                    let delay = backoff_delay(attempt);
                    warn!(
                        "Retrying upload (attempt {}/{}), waiting {:?}: {}",
                        attempt, self.max_retries, delay, e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(url = %destination.target_url, error = %e, "Upload request failed");
                    return Err(AppError::Http(e));
                }
            }
        }
    }
}

/// Exponential backoff with up to 50% random jitter.
fn backoff_delay(attempt: u32) -> Duration {
    let base = 100 * 2u64.pow(attempt.min(10));
    let jitter = rand::thread_rng().gen_range(0..=base / 2);
    Duration::from_millis(base + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingKey;

    fn client(store: ConfigStore) -> UploadClient {
        UploadClient::new(store, &TransportConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_public_key() {
        let store = ConfigStore::in_memory();
        store.save_target_url("http://127.0.0.1:9/upload").await;

        let err = client(store).upload_text("fail").await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert_eq!(err.to_string(), "Missing configuration: Public Key or Target URL");
    }

    #[tokio::test]
    async fn test_missing_target_url() {
        let store = ConfigStore::in_memory();
        store.save_recipient_public_key("pubkey").await;

        let err = client(store).upload_audio_bytes(b"audio").await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_empty_values_count_as_missing() {
        let store = ConfigStore::in_memory();
        store.set_value(SettingKey::RecipientPublicKey, "").await;
        store.save_target_url("http://127.0.0.1:9/upload").await;

        let err = client(store).upload_text("fail").await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_config_checked_before_reading_audio() {
        let store = ConfigStore::in_memory();
        let err = client(store)
            .upload_audio("/definitely/not/a/recording.m4a")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_bad_public_key_surfaces_crypto_error() {
        let store = ConfigStore::in_memory();
        store.save_recipient_public_key("Not a key").await;
        store.save_target_url("http://127.0.0.1:9/upload").await;

        let err = client(store).upload_text("hello").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Crypto(crypto::CryptoError::KeyParse(_))
        ));
    }

    #[test]
    fn test_backoff_grows_with_jitter_bound() {
        for attempt in 1..=4 {
            let base = 100 * 2u64.pow(attempt);
            let delay = backoff_delay(attempt).as_millis() as u64;
            assert!(delay >= base && delay <= base + base / 2);
        }
    }
}
