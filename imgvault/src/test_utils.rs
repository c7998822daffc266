//! Test utilities: signing keys, image fixtures and app construction.

use crate::auth::Authorizer;
use crate::config::Config;
use crate::digest::ContentDigest;
use crate::storage::{FileStorage, StorageError, StoragePath, StoredFile};
use crate::{AppState, Application};
use async_trait::async_trait;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use k256::schnorr::{SigningKey, signature::hazmat::PrehashSigner};
use std::path::Path;
use std::sync::Arc;

/// A deterministic secp256k1 key for signing test uploads.
pub struct TestSigner {
    key: SigningKey,
}

impl TestSigner {
    /// Key derived from a repeated byte. `seed` must be non-zero.
    pub fn new(seed: u8) -> Self {
        let key = SigningKey::from_bytes(&[seed; 32]).expect("valid secret key");
        Self { key }
    }

    pub fn pubkey_hex(&self) -> String {
        hex::encode(self.key.verifying_key().to_bytes())
    }

    /// Hex signature over the SHA-256 digest of `content`
    pub fn sign(&self, content: &[u8]) -> String {
        self.sign_prehash(ContentDigest::compute(content).as_bytes())
    }

    /// Hex signature with `message` used directly as the 32-byte BIP-340 message
    pub fn sign_prehash(&self, message: &[u8]) -> String {
        let signature = self.key.sign_prehash(message).expect("signing should succeed");
        hex::encode(signature.to_bytes())
    }
}

/// A PNG signature and IHDR start, padded with a counting pattern to `len` bytes.
pub fn png_bytes(len: usize) -> Vec<u8> {
    fixture(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R'], len)
}

/// A JFIF header padded to `len` bytes.
pub fn jpeg_bytes(len: usize) -> Vec<u8> {
    fixture(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00], len)
}

pub fn gif_bytes() -> Vec<u8> {
    fixture(b"GIF89a\x01\x00\x01\x00\x80\x00\x00", 64)
}

fn fixture(header: &[u8], len: usize) -> Vec<u8> {
    let mut content = header.to_vec();
    content.extend((0..len.saturating_sub(header.len())).map(|i| (i % 251) as u8));
    content
}

pub fn create_test_config(dir: &Path) -> Config {
    Config {
        dir: dir.to_path_buf(),
        domain: Some("http://localhost:8080".parse().expect("valid domain")),
        ..Default::default()
    }
}

pub async fn create_test_app(config: Config) -> TestServer {
    Application::new(config)
        .await
        .expect("Failed to create application")
        .into_test_server()
}

/// Upload form with the three expected fields.
pub fn upload_form(filename: &str, content: &[u8], pubkey: &str, signature: &str) -> MultipartForm {
    MultipartForm::new()
        .add_part("file", Part::bytes(content.to_vec()).file_name(filename.to_string()))
        .add_text("pubkey", pubkey.to_string())
        .add_text("signature", signature.to_string())
}

/// Upload form signed by `signer` over `content`.
pub fn signed_form(signer: &TestSigner, filename: &str, content: &[u8]) -> MultipartForm {
    upload_form(filename, content, &signer.pubkey_hex(), &signer.sign(content))
}

/// Every regular file under `dir`, recursively.
pub fn stored_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return files;
    };
    for entry in entries {
        let path = entry.expect("readable entry").path();
        if path.is_dir() {
            files.extend(stored_files(&path));
        } else {
            files.push(path);
        }
    }
    files.sort();
    files
}

/// Storage backend whose writes always fail.
pub struct FailingStorage;

#[async_trait]
impl FileStorage for FailingStorage {
    async fn store(&self, path: &StoragePath, _content: &[u8]) -> crate::storage::Result<StoredFile> {
        Err(StorageError::Write {
            path: path.relative_path(),
            source: std::io::Error::other("disk full"),
        })
    }
}

/// Test server whose storage backend is `storage`, serving static files from `static_root`.
pub fn create_test_server_with_storage(config: Config, storage: Arc<dyn FileStorage>, static_root: &Path) -> TestServer {
    let state = AppState::builder()
        .domain(config.domain.clone().expect("test config has a domain"))
        .authorizer(Arc::new(Authorizer::new(config.allowlist())))
        .config(config)
        .storage(storage)
        .build();

    TestServer::new(crate::build_router(state, static_root)).expect("Failed to create test server")
}
