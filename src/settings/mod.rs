//! Persistent storage for the three delivery settings.
//!
//! The recipient public key, target URL and shared secret are written by a
//! settings surface (the CLI) and read on every upload. Nothing is validated at
//! rest; the uploader checks what it needs at use time.

pub mod backend;
pub mod store;

pub use backend::{FileBackend, MemoryBackend, SettingsBackend, StoreError};
pub use store::ConfigStore;

use std::fmt;
use std::str::FromStr;

/// The fixed setting slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// PEM-encoded RSA public key of the recipient
    RecipientPublicKey,
    /// Endpoint uploads are POSTed to
    TargetUrl,
    /// Value sent in the `X-Auth-Secret` header
    AuthSecret,
}

impl SettingKey {
    pub const ALL: [SettingKey; 3] = [Self::RecipientPublicKey, Self::TargetUrl, Self::AuthSecret];

    /// Slot name used by every backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RecipientPublicKey => "recipientPublicKey",
            Self::TargetUrl => "targetUrl",
            Self::AuthSecret => "authSecret",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| StoreError::UnknownKey(s.to_string()))
    }
}
