//! Object-store abstraction trait
//!
//! This module defines the ObjectStore trait that all bucket backends must
//! implement, together with the storage error taxonomy.

use async_trait::async_trait;
use bytes::Bytes;
use docvault_core::AppError;
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Copy failed: {0}")]
    CopyFailed(String),

    /// Copy succeeded but the source could not be deleted; a duplicate object
    /// exists and the caller must reconcile.
    #[error("Move incomplete, source object retained: {0}")]
    MoveIncomplete(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => {
                AppError::NotFound(format!("object does not exist for key: {}", key))
            }
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Outcome of a bucket head-probe. "Can't tell" is carried explicitly so
/// callers never conflate a transport failure with a confirmed-absent bucket.
#[derive(Debug)]
pub enum BucketStatus {
    Exists,
    Missing,
    Unknown(StorageError),
}

impl BucketStatus {
    pub fn is_exists(&self) -> bool {
        matches!(self, BucketStatus::Exists)
    }
}

/// Object-store abstraction trait
///
/// All bucket backends (S3-compatible, in-memory) must implement this trait.
/// This allows the file and link services to work with any backend without
/// coupling to specific implementation details.
///
/// When a customer encryption key is configured, every read and write of an
/// object attaches the same algorithm/key/digest triple; a backend never
/// degrades to plaintext on a key mismatch.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes at the given object key, overwriting any existing object.
    /// Overwrite is idempotent; a pre-existing key is not an error.
    async fn upload(&self, object_key: &str, content_type: &str, data: Bytes)
        -> StorageResult<()>;

    /// Fetch an object fully into memory.
    async fn download(&self, object_key: &str) -> StorageResult<Bytes>;

    /// Fetch an object as a lazily-read stream of chunks.
    async fn download_stream(
        &self,
        object_key: &str,
    ) -> StorageResult<Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>>;

    /// Bulk-delete objects under a bounded timeout. Partial failure is
    /// reported as one aggregate error; keys that do not exist are not an
    /// error. Callers in metadata-delete flows treat failure as non-fatal.
    async fn delete_keys(&self, object_keys: &[String]) -> StorageResult<()>;

    /// Non-destructive duplication of one object to a new key, under an
    /// extended timeout (two round-trips against a remote service).
    async fn copy(&self, source_key: &str, destination_key: &str) -> StorageResult<()>;

    /// Move, as copy-then-delete-source. If the copy lands but the source
    /// delete fails this returns `MoveIncomplete`: the bucket holds a
    /// duplicate, never a loss.
    async fn cut(&self, source_key: &str, destination_key: &str) -> StorageResult<()>;

    /// Generate a time-bounded presigned URL for anonymous inline GET access
    /// to one object. The URL is valid for exactly `expires_in`; expiry is
    /// enforced by the remote service.
    async fn presigned_url(&self, object_key: &str, expires_in: Duration)
        -> StorageResult<String>;

    /// Same as [`presigned_url`](ObjectStore::presigned_url) but with a
    /// forced-download content disposition.
    async fn downloadable_presigned_url(
        &self,
        object_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Head-probe for a single object. `Ok(false)` only when the backend
    /// positively reports not-found.
    async fn exists(&self, object_key: &str) -> StorageResult<bool>;

    /// Head-probe for a bucket. Distinguishes exists / confirmed-absent /
    /// unknown-due-to-error; both non-exists outcomes are fatal at startup.
    async fn bucket_status(&self, bucket_name: &str) -> BucketStatus;

    /// Enumerate every object key in the bucket. Feeds the legacy key
    /// resolution fallback; not used on the primary lookup path.
    async fn list_keys(&self) -> StorageResult<Vec<String>>;
}
