//! Content-addressed file storage.
//!
//! Every stored file lives at a path derived only from its digest and the extension of the name
//! it was uploaded under:
//!
//! ```text
//! <root>/ba7/816/bf8/f01/ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad.png
//!        ^^^^^^^^^^^^^^^ first 12 hex chars, four levels of three
//! ```
//!
//! Uploading the same bytes again resolves to the same path and overwrites it with identical
//! content.

pub mod local;

pub use local::LocalFileStorage;

use crate::digest::ContentDigest;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Number of nested shard directories.
pub const SHARD_DEPTH: usize = 4;
/// Hex characters per shard directory name.
pub const SHARD_WIDTH: usize = 3;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDirectory { path: PathBuf, source: std::io::Error },

    #[error("Failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: std::io::Error },

    #[error("Failed to move {} into place: {source}", .path.display())]
    Rename { path: PathBuf, source: std::io::Error },

    #[error("Failed to resolve storage root {}: {source}", .path.display())]
    Root { path: PathBuf, source: std::io::Error },
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Relative location of a stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath {
    shards: [String; SHARD_DEPTH],
    file_name: String,
}

impl StoragePath {
    /// Derive the path for content with `digest` uploaded as `original_filename`.
    pub fn new(digest: &ContentDigest, original_filename: &str) -> Self {
        let hex = digest.to_hex();
        let shards = std::array::from_fn(|i| hex[i * SHARD_WIDTH..(i + 1) * SHARD_WIDTH].to_string());
        let file_name = format!("{hex}{}", file_extension(original_filename));

        Self { shards, file_name }
    }

    pub fn shards(&self) -> &[String; SHARD_DEPTH] {
        &self.shards
    }

    /// Leaf name: digest hex plus the original extension
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Shard directories relative to the storage root
    pub fn directory(&self) -> PathBuf {
        self.shards.iter().collect()
    }

    /// Full path relative to the storage root
    pub fn relative_path(&self) -> PathBuf {
        self.directory().join(&self.file_name)
    }

    /// The same location as a `/`-separated URL path, without a leading slash.
    pub fn url_path(&self) -> String {
        format!("{}/{}", self.shards.join("/"), self.file_name)
    }
}

/// Extension of the final component of `filename`, including the leading dot.
///
/// Returns everything from the last `.` of the last path component, or `""` if that component
/// has no dot. Both `/` and `\` count as separators so a declared filename can never contribute
/// a directory to the stored name.
pub fn file_extension(filename: &str) -> &str {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    name.rfind('.').map_or("", |idx| &name[idx..])
}

/// A file that has been written to storage.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: StoragePath,
    pub size_bytes: u64,
}

/// Trait for storage backends
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Write `content` at `path`, replacing any file already there.
    ///
    /// Implementations must never leave a partially written file visible at `path`.
    async fn store(&self, path: &StoragePath, content: &[u8]) -> Result<StoredFile>;
}
