use anyhow::{bail, Context};
use sealdrop::config::AppConfig;
use sealdrop::crypto::{self, DecryptedNote, RecipientPrivateKey, RecipientPublicKey};
use sealdrop::{ConfigStore, SettingKey, UploadClient};
use sealdrop_types::{EncryptedEnvelope, UploadRequest};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A captured upload: either the full request body or just its envelope.
#[derive(Debug)]
pub enum Capture {
    Request(UploadRequest),
    Envelope(EncryptedEnvelope),
}

pub fn parse_capture(json: &str) -> anyhow::Result<Capture> {
    let value: Value = serde_json::from_str(json).context("capture is not valid JSON")?;
    if value.get("payload").is_some() {
        let request = serde_json::from_value(value).context("malformed upload request")?;
        Ok(Capture::Request(request))
    } else {
        let envelope = serde_json::from_value(value).context("malformed envelope")?;
        Ok(Capture::Envelope(envelope))
    }
}

pub async fn set(store: &ConfigStore, key: SettingKey, value: &str) -> anyhow::Result<()> {
    store
        .try_set_value(key, value)
        .await
        .with_context(|| format!("failed to save {key}"))?;
    info!(slot = %key, "Setting saved");
    Ok(())
}

pub async fn set_key_file(store: &ConfigStore, path: &Path) -> anyhow::Result<()> {
    let pem = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    // Stored as-is; a bad key only surfaces at upload time.
    if let Err(e) = RecipientPublicKey::from_pem(&pem) {
        warn!(error = %e, "Key file does not parse as an RSA public key");
    }
    set(store, SettingKey::RecipientPublicKey, &pem).await
}

pub async fn get(store: &ConfigStore, key: SettingKey) -> anyhow::Result<()> {
    match store.get_value(key).await {
        Some(value) => println!("{value}"),
        None => bail!("{key} is not set"),
    }
    Ok(())
}

pub async fn show(store: &ConfigStore) -> anyhow::Result<()> {
    print!("{}", render_settings(store).await);
    Ok(())
}

pub async fn render_settings(store: &ConfigStore) -> String {
    let key = match store.recipient_public_key().await {
        Some(pem) if !pem.is_empty() => match RecipientPublicKey::from_pem(&pem) {
            Ok(key) => format!("RSA {} bits", key.bits()),
            Err(e) => format!("unusable ({e})"),
        },
        _ => "<unset>".to_string(),
    };
    let url = store
        .target_url()
        .await
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "<unset>".to_string());
    let secret = match store.auth_secret().await {
        Some(s) if !s.is_empty() => "<set>",
        _ => "<unset>",
    };

    format!(
        "{}: {key}\n{}: {url}\n{}: {secret}\n",
        SettingKey::RecipientPublicKey,
        SettingKey::TargetUrl,
        SettingKey::AuthSecret,
    )
}

pub async fn send_text(store: ConfigStore, config: &AppConfig, text: &str) -> anyhow::Result<()> {
    let client = UploadClient::new(store, &config.transport)?;
    let response = client.upload_text(text).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

pub async fn send_audio(store: ConfigStore, config: &AppConfig, path: &Path) -> anyhow::Result<()> {
    let client = UploadClient::new(store, &config.transport)?;
    let response = client.upload_audio(path).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn load_private_key(path: &Path) -> anyhow::Result<RecipientPrivateKey> {
    let pem = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(RecipientPrivateKey::from_pem(&pem)?)
}

pub fn decrypt(capture_path: &Path, key_path: &Path, out: Option<&Path>) -> anyhow::Result<()> {
    let capture = fs::read_to_string(capture_path)
        .with_context(|| format!("failed to read {}", capture_path.display()))?;
    let recipient = load_private_key(key_path)?;

    let plaintext = match parse_capture(&capture)? {
        Capture::Request(request) => match crypto::open_upload(&request, &recipient)? {
            DecryptedNote::Text(text) => text.into_bytes(),
            DecryptedNote::Audio(bytes) => {
                if out.is_none() {
                    bail!("capture holds audio; pass --out to write it");
                }
                bytes
            }
        },
        Capture::Envelope(envelope) => crypto::open(&envelope, &recipient)?,
    };

    match out {
        Some(path) => {
            fs::write(path, &plaintext)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(bytes = plaintext.len(), path = %path.display(), "Plaintext written");
        }
        None => {
            let text = String::from_utf8(plaintext)
                .context("plaintext is not UTF-8; pass --out to write it")?;
            println!("{text}");
        }
    }
    Ok(())
}

/// Outcome of a pass over the ingest storage directory.
#[derive(Debug, Default)]
pub struct ProcessReport {
    pub written: Vec<PathBuf>,
    pub skipped: usize,
}

/// Output file name for one stored upload, keyed by its ingest id.
fn output_name(id: &str, note: &DecryptedNote) -> String {
    match note {
        DecryptedNote::Text(_) => format!("received_text_{id}.txt"),
        DecryptedNote::Audio(_) => format!("received_audio_{id}.m4a"),
    }
}

fn open_stored(path: &Path, recipient: &RecipientPrivateKey) -> anyhow::Result<DecryptedNote> {
    let contents = fs::read_to_string(path).context("unreadable")?;
    let request: UploadRequest =
        serde_json::from_str(&contents).context("not an upload request")?;
    Ok(crypto::open_upload(&request, recipient)?)
}

/// Decrypt every `<id>.json` in `storage_dir` into `out_dir`.
///
/// Entries that fail to parse or decrypt are logged and skipped. Output names
/// are derived from the stored id, so a second pass overwrites the same files.
pub fn process_dir(
    storage_dir: &Path,
    recipient: &RecipientPrivateKey,
    out_dir: &Path,
) -> anyhow::Result<ProcessReport> {
    let mut stored: Vec<PathBuf> = fs::read_dir(storage_dir)
        .with_context(|| format!("failed to list {}", storage_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    stored.sort();

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut report = ProcessReport::default();
    for path in stored {
        let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
            report.skipped += 1;
            continue;
        };
        let note = match open_stored(&path, recipient) {
            Ok(note) => note,
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{e:#}"), "Skipping stored upload");
                report.skipped += 1;
                continue;
            }
        };

        let target = out_dir.join(output_name(id, &note));
        let bytes = match &note {
            DecryptedNote::Text(text) => text.as_bytes(),
            DecryptedNote::Audio(recording) => recording.as_slice(),
        };
        fs::write(&target, bytes)
            .with_context(|| format!("failed to write {}", target.display()))?;
        info!(kind = note.kind().as_str(), path = %target.display(), "Saved note");
        report.written.push(target);
    }

    Ok(report)
}

pub fn process(storage_dir: &Path, key_path: &Path, out_dir: &Path) -> anyhow::Result<()> {
    let recipient = load_private_key(key_path)?;
    let report = process_dir(storage_dir, &recipient, out_dir)?;

    for path in &report.written {
        println!("{}", path.display());
    }
    info!(
        written = report.written.len(),
        skipped = report.skipped,
        "Processed stored uploads"
    );
    Ok(())
}
