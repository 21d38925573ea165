//! Key-value backends for the settings store.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Settings storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings file unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file corrupt: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no config directory available on this platform")]
    NoConfigDir,

    #[error("unknown setting '{0}'; expected one of recipientPublicKey, targetUrl, authSecret")]
    UnknownKey(String),
}

/// Persistent string storage keyed by slot name.
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, name: &str, value: &str) -> Result<(), StoreError>;
}

/// In-process backend; values live as long as the backend does.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: DashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsBackend for MemoryBackend {
    async fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(name).map(|v| v.value().clone()))
    }

    async fn set(&self, name: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

/// Backend persisting all slots as one JSON object in a single file.
///
/// A missing file reads as empty. Writes go through a temporary file and a
/// rename so a crash never leaves a half-written settings file behind.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `<config dir>/sealdrop/settings.json`
    pub fn default_location() -> Result<Self, StoreError> {
        let dir = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(Self::new(dir.join("sealdrop").join("settings.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SettingsBackend for FileBackend {
    async fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all().await?.remove(name))
    }

    async fn set(&self, name: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut values = self.read_all().await?;
        values.insert(name.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&values)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(slot = name, path = %self.path.display(), "Setting persisted");
        Ok(())
    }
}
