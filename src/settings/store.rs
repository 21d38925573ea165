//! Settings store handed to the uploader and the settings surface.

use std::sync::Arc;
use tracing::error;

use super::backend::{MemoryBackend, SettingsBackend, StoreError};
use super::SettingKey;

/// Typed access to the three setting slots over any backend.
///
/// Writes through [`ConfigStore::set_value`] log and swallow backend failures;
/// reads through [`ConfigStore::get_value`] return `None` both for an empty slot
/// and for a failed read. Callers that must know whether a write landed use
/// [`ConfigStore::try_set_value`].
#[derive(Clone)]
pub struct ConfigStore {
    backend: Arc<dyn SettingsBackend>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore").finish_non_exhaustive()
    }
}

impl ConfigStore {
    pub fn new(backend: Arc<dyn SettingsBackend>) -> Self {
        Self { backend }
    }

    /// Store backed by process memory only.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Persist `value` under `key`. A backend failure is logged and dropped.
    pub async fn set_value(&self, key: SettingKey, value: &str) {
        if let Err(e) = self.backend.set(key.as_str(), value).await {
            error!(slot = %key, error = %e, "Failed to save setting");
        }
    }

    /// Persist `value` under `key`, surfacing backend failures.
    pub async fn try_set_value(&self, key: SettingKey, value: &str) -> Result<(), StoreError> {
        self.backend.set(key.as_str(), value).await.map_err(|e| {
            error!(slot = %key, error = %e, "Failed to save setting");
            e
        })
    }

    /// Stored value, or `None` if the slot is empty or could not be read.
    pub async fn get_value(&self, key: SettingKey) -> Option<String> {
        match self.backend.get(key.as_str()).await {
            Ok(value) => value,
            Err(e) => {
                error!(slot = %key, error = %e, "Failed to load setting");
                None
            }
        }
    }

    pub async fn recipient_public_key(&self) -> Option<String> {
        self.get_value(SettingKey::RecipientPublicKey).await
    }

    pub async fn target_url(&self) -> Option<String> {
        self.get_value(SettingKey::TargetUrl).await
    }

    pub async fn auth_secret(&self) -> Option<String> {
        self.get_value(SettingKey::AuthSecret).await
    }

    pub async fn save_recipient_public_key(&self, pem: &str) {
        self.set_value(SettingKey::RecipientPublicKey, pem).await
    }

    pub async fn save_target_url(&self, url: &str) {
        self.set_value(SettingKey::TargetUrl, url).await
    }

    pub async fn save_auth_secret(&self, secret: &str) {
        self.set_value(SettingKey::AuthSecret, secret).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend whose every operation fails.
    #[derive(Default)]
    struct BrokenBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SettingsBackend for BrokenBackend {
        async fn get(&self, _name: &str) -> Result<Option<String>, StoreError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Err(StoreError::NoConfigDir)
        }

        async fn set(&self, _name: &str, _value: &str) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Err(StoreError::NoConfigDir)
        }
    }

    #[tokio::test]
    async fn test_save_and_get_each_slot() {
        let store = ConfigStore::in_memory();

        store.save_recipient_public_key("test-key").await;
        store.save_target_url("http://test.com").await;
        store.save_auth_secret("super-secret").await;

        assert_eq!(store.recipient_public_key().await, Some("test-key".to_string()));
        assert_eq!(store.target_url().await, Some("http://test.com".to_string()));
        assert_eq!(store.auth_secret().await, Some("super-secret".to_string()));
    }

    #[tokio::test]
    async fn test_slots_are_independent() {
        let store = ConfigStore::in_memory();
        store.save_target_url("http://only-url").await;

        assert_eq!(store.recipient_public_key().await, None);
        assert_eq!(store.auth_secret().await, None);
    }

    #[tokio::test]
    async fn test_failed_write_is_swallowed() {
        let backend = Arc::new(BrokenBackend::default());
        let store = ConfigStore::new(backend.clone());

        store.set_value(SettingKey::TargetUrl, "http://lost").await;
        assert_eq!(backend.calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_try_set_surfaces_failure() {
        let store = ConfigStore::new(Arc::new(BrokenBackend::default()));
        let result = store.try_set_value(SettingKey::TargetUrl, "http://lost").await;
        assert!(matches!(result, Err(StoreError::NoConfigDir)));
    }

    #[tokio::test]
    async fn test_failed_read_looks_like_empty_slot() {
        let store = ConfigStore::new(Arc::new(BrokenBackend::default()));
        assert_eq!(store.get_value(SettingKey::RecipientPublicKey).await, None);
    }
}
