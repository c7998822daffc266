use super::{FileStorage, Result, StorageError, StoragePath, StoredFile};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Local filesystem storage backend - stores files under a root directory.
///
/// Writes go to a uniquely named temporary file in the target shard directory and are renamed
/// onto the final path once flushed, so concurrent uploads of the same content only ever replace
/// a complete file with another complete, identical file.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Create the root directory if needed and anchor it to an absolute path.
    pub async fn create(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref();
        fs::create_dir_all(base_path).await.map_err(|source| StorageError::CreateDirectory {
            path: base_path.to_path_buf(),
            source,
        })?;
        let base_path = std::path::absolute(base_path).map_err(|source| StorageError::Root {
            path: base_path.to_path_buf(),
            source,
        })?;

        Ok(Self { base_path })
    }

    pub fn root(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    #[instrument(skip(self, content), fields(path = %path.url_path(), size = content.len()))]
    async fn store(&self, path: &StoragePath, content: &[u8]) -> Result<StoredFile> {
        let directory = self.base_path.join(path.directory());
        fs::create_dir_all(&directory).await.map_err(|source| StorageError::CreateDirectory {
            path: directory.clone(),
            source,
        })?;

        let final_path = directory.join(path.file_name());
        let temp_path = directory.join(format!(".{}.{}.tmp", path.file_name(), uuid::Uuid::new_v4()));

        // Removes the temporary file on every exit, including cancellation, unless it was renamed
        let temp_path = scopeguard::guard(temp_path, |temp_path| {
            if let Err(e) = std::fs::remove_file(&temp_path)
                && e.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(path = %temp_path.display(), error = %e, "Failed to remove temporary upload file");
            }
        });

        let write_err = |source| StorageError::Write {
            path: final_path.clone(),
            source,
        };
        let mut file = fs::File::create(&*temp_path).await.map_err(write_err)?;
        file.write_all(content).await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        fs::rename(&*temp_path, &final_path).await.map_err(|source| StorageError::Rename {
            path: final_path.clone(),
            source,
        })?;
        scopeguard::ScopeGuard::into_inner(temp_path);

        debug!(path = %final_path.display(), "Stored file");

        Ok(StoredFile {
            path: path.clone(),
            size_bytes: content.len() as u64,
        })
    }
}
