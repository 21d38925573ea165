use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::settings::{FileBackend, StoreError};

/// Default ingest body limit (32 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Where the delivery settings are persisted
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    /// Settings file; defaults to `<config dir>/sealdrop/settings.json`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Upload client behaviour.
///
/// The defaults give a single best-effort attempt with the HTTP client's own
/// timeout behaviour.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TransportConfig {
    /// Whole-request deadline in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Extra attempts after a connection failure or timeout
    #[serde(default)]
    pub max_retries: u32,
}

/// Ingest receiver settings
#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_ingest_host")]
    pub host: String,
    #[serde(default = "default_ingest_port")]
    pub port: u16,
    /// Directory accepted uploads are written to
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    /// Expected `X-Auth-Secret`; without one every upload is rejected
    #[serde(default)]
    pub auth_secret: Option<String>,
    /// Largest accepted request body. Audio is base64-encoded twice on the
    /// wire, so this must be well above the largest expected recording.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_ingest_host() -> String {
    "0.0.0.0".to_string()
}

fn default_ingest_port() -> u16 {
    8080
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            host: default_ingest_host(),
            port: default_ingest_port(),
            storage_dir: default_storage_dir(),
            auth_secret: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl IngestConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Root application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., SEALDROP_TRANSPORT__TIMEOUT_SECS, SEALDROP_INGEST__AUTH_SECRET
            .add_source(
                Environment::with_prefix("SEALDROP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Settings backend at the configured path, or the platform default.
    pub fn settings_backend(&self) -> Result<FileBackend, StoreError> {
        match &self.store.path {
            Some(path) => Ok(FileBackend::new(path)),
            None => FileBackend::default_location(),
        }
    }
}
