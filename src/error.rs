use thiserror::Error;

use crate::crypto::CryptoError;

/// Message shown when the recipient key or target URL has not been set.
pub const MISSING_CONFIGURATION: &str = "Missing configuration: Public Key or Target URL";

/// Application-wide error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Recipient key or target URL missing; fixed by editing the settings
    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The endpoint answered with a non-2xx status
    #[error("Upload failed: {status_text}")]
    Upload { status: u16, status_text: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid server response: {0}")]
    InvalidResponse(String),

    #[error("Audio source unreadable: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn missing_configuration() -> Self {
        Self::Configuration(MISSING_CONFIGURATION.to_string())
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
