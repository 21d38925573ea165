pub mod config;
pub mod crypto;
pub mod error;
pub mod ingest;
pub mod settings;
pub mod transport;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use settings::{ConfigStore, SettingKey};
pub use transport::UploadClient;
