//! End-to-end: the upload client talking to the real ingest receiver.
//!
//! Uploads land on disk still sealed; the tests read them back and open them
//! with the recipient's private key.

use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;
use tokio::net::TcpListener;

use sealdrop::config::TransportConfig;
use sealdrop::crypto::{open_upload, DecryptedNote, RecipientPrivateKey};
use sealdrop::ingest::{ingest_router, IngestState};
use sealdrop::{AppError, ConfigStore, UploadClient};
use sealdrop_types::{IngestReceipt, UploadRequest};

const SECRET: &str = "correct horse";

fn keypair() -> &'static (RecipientPrivateKey, String) {
    static KEYS: OnceLock<(RecipientPrivateKey, String)> = OnceLock::new();
    KEYS.get_or_init(|| {
        let private = RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).unwrap();
        let pem = RsaPublicKey::from(&private)
            .to_public_key_pem(LineEnding::LF)
            .unwrap();
        (RecipientPrivateKey::from(private), pem)
    })
}

/// Start an ingest receiver on a random port, storing into `dir`.
async fn start_receiver(dir: &Path) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    let state = Arc::new(IngestState::new(Some(SECRET.to_string()), dir));

    tokio::spawn(async move {
        axum::serve(listener, ingest_router(state)).await.unwrap();
    });
    url
}

async fn client_for(url: &str, secret: &str) -> UploadClient {
    let store = ConfigStore::in_memory();
    store.save_recipient_public_key(&keypair().1).await;
    store.save_target_url(url).await;
    store.save_auth_secret(secret).await;
    UploadClient::new(store, &TransportConfig::default()).unwrap()
}

fn stored_request(dir: &Path, receipt: &IngestReceipt) -> UploadRequest {
    let path: PathBuf = dir.join(format!("{}.json", receipt.id));
    let bytes = std::fs::read(path).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_text_note_stored_and_recovered() {
    let dir = TempDir::new().unwrap();
    let url = start_receiver(dir.path()).await;
    let client = client_for(&url, SECRET).await;

    let response = client.upload_text("the vault code is 4711").await.unwrap();
    let receipt: IngestReceipt = serde_json::from_value(response).unwrap();
    assert_eq!(receipt.status, "success");

    let request = stored_request(dir.path(), &receipt);
    let note = open_upload(&request, &keypair().0).unwrap();
    assert_eq!(note, DecryptedNote::Text("the vault code is 4711".to_string()));
}

#[tokio::test]
async fn test_audio_note_stored_and_recovered() {
    let dir = TempDir::new().unwrap();
    let url = start_receiver(dir.path()).await;
    let client = client_for(&url, SECRET).await;

    let recording = vec![0x1a, 0x45, 0xdf, 0xa3, 0x00, 0xff];
    let response = client.upload_audio_bytes(&recording).await.unwrap();
    let receipt: IngestReceipt = serde_json::from_value(response).unwrap();

    let request = stored_request(dir.path(), &receipt);
    let note = open_upload(&request, &keypair().0).unwrap();
    assert_eq!(note, DecryptedNote::Audio(recording));
}

#[tokio::test]
async fn test_wrong_secret_is_rejected() {
    let dir = TempDir::new().unwrap();
    let url = start_receiver(dir.path()).await;
    let client = client_for(&url, "guess").await;

    let err = client.upload_text("hi").await.unwrap_err();
    assert!(matches!(err, AppError::Upload { status: 401, .. }));
    assert_eq!(err.to_string(), "Upload failed: Unauthorized");

    let stored = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn test_each_upload_gets_its_own_file() {
    let dir = TempDir::new().unwrap();
    let url = start_receiver(dir.path()).await;
    let client = client_for(&url, SECRET).await;

    let first: IngestReceipt =
        serde_json::from_value(client.upload_text("a").await.unwrap()).unwrap();
    let second: IngestReceipt =
        serde_json::from_value(client.upload_text("b").await.unwrap()).unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[tokio::test]
async fn test_large_recording_accepted() {
    let dir = TempDir::new().unwrap();
    let url = start_receiver(dir.path()).await;
    let client = client_for(&url, SECRET).await;

    // Double base64 puts this well past 2 MB on the wire
    let recording: Vec<u8> = (0..1_600_000u32).map(|i| (i % 251) as u8).collect();
    let response = client.upload_audio_bytes(&recording).await.unwrap();
    let receipt: IngestReceipt = serde_json::from_value(response).unwrap();

    let request = stored_request(dir.path(), &receipt);
    let note = open_upload(&request, &keypair().0).unwrap();
    assert_eq!(note, DecryptedNote::Audio(recording));
}
