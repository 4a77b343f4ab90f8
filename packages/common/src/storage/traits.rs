use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::digest::Digest;
use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Content-addressed blob storage.
///
/// Blobs are immutable: once a digest resolves to content, it resolves to
/// that content forever. There is no delete; rows referencing a blob may
/// come and go, orphaned blobs are an accepted cost.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return the content digest.
    async fn put(&self, data: &[u8]) -> Result<Digest, StorageError>;

    /// Retrieve all bytes for a blob by its content digest.
    async fn get(&self, digest: &Digest) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(digest).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve a blob as a streaming async reader.
    async fn get_stream(&self, digest: &Digest) -> Result<BoxReader, StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, digest: &Digest) -> Result<bool, StorageError>;

    /// Get the size of a blob in bytes.
    async fn size(&self, digest: &Digest) -> Result<u64, StorageError>;
}
