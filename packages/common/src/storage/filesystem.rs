use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::BufReader;

use super::digest::Digest;
use super::error::StorageError;
use super::traits::{BlobStore, BoxReader};

/// Filesystem-backed content-addressed blob store.
///
/// Blobs are stored in a sharded directory layout keyed by the digest:
/// `{base_path}/{first 2 hex chars}/{full 40 hex chars}`. The two-character
/// shard keeps directory fan-out bounded.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Compute the filesystem path for a given digest.
    fn blob_path(&self, digest: &Digest) -> PathBuf {
        self.base_path
            .join(digest.shard_prefix())
            .join(digest.to_hex())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, data: &[u8]) -> Result<Digest, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let digest = Digest::compute(data);
        let blob_path = self.blob_path(&digest);

        // Identical content always lands on the identical path, so an
        // existing file already holds these exact bytes.
        if blob_path.exists() {
            return Ok(digest);
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(digest)
    }

    async fn get_stream(&self, digest: &Digest) -> Result<BoxReader, StorageError> {
        let blob_path = self.blob_path(digest);
        match fs::File::open(&blob_path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(digest.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, digest: &Digest) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(digest);
        Ok(fs::try_exists(&blob_path).await?)
    }

    async fn size(&self, digest: &Digest) -> Result<u64, StorageError> {
        let blob_path = self.blob_path(digest);
        match fs::metadata(&blob_path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(digest.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
