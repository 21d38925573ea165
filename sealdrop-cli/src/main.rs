mod commands;

use clap::{Parser, Subcommand};
use sealdrop::settings::{ConfigStore, FileBackend};
use sealdrop::{AppConfig, SettingKey};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sealdrop")]
#[command(about = "Encrypt notes and recordings and deliver them to a configured endpoint")]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the recipient key, target URL and auth secret
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Encrypt and upload a text note
    SendText {
        text: String,
    },
    /// Encrypt and upload a finished audio recording
    SendAudio {
        path: PathBuf,
    },
    /// Decrypt a captured upload request or bare envelope
    Decrypt {
        /// JSON file holding the upload request or envelope
        request: PathBuf,
        /// Recipient's PEM private key
        private_key: PathBuf,
        /// Write the plaintext here instead of printing it
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Decrypt every upload stored by the ingest receiver
    Process {
        /// Ingest storage directory holding `<id>.json` uploads
        storage_dir: PathBuf,
        /// Recipient's PEM private key
        private_key: PathBuf,
        /// Directory the decrypted notes are written to
        #[arg(long, default_value = "output")]
        out_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Store a value (recipientPublicKey, targetUrl, authSecret)
    Set { key: SettingKey, value: String },
    /// Store the recipient public key from a PEM file
    SetKeyFile { path: PathBuf },
    /// Print one stored value
    Get { key: SettingKey },
    /// Summarize all settings, secret redacted
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sealdrop=info,sealdrop_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    let backend = match cli.settings {
        Some(path) => FileBackend::new(path),
        None => config.settings_backend()?,
    };
    let store = ConfigStore::new(Arc::new(backend));

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Set { key, value } => commands::set(&store, key, &value).await,
            ConfigAction::SetKeyFile { path } => commands::set_key_file(&store, &path).await,
            ConfigAction::Get { key } => commands::get(&store, key).await,
            ConfigAction::Show => commands::show(&store).await,
        },
        Commands::SendText { text } => commands::send_text(store, &config, &text).await,
        Commands::SendAudio { path } => commands::send_audio(store, &config, &path).await,
        Commands::Decrypt {
            request,
            private_key,
            out,
        } => commands::decrypt(&request, &private_key, out.as_deref()),
        Commands::Process {
            storage_dir,
            private_key,
            out_dir,
        } => commands::process(&storage_dir, &private_key, &out_dir),
    }
}
