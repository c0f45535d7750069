//! Storage stand-in that fails every call.
//!
//! The happy path is covered by `MemoryObjectStore`; this mock exercises the
//! degraded paths, where services must decide whether a bucket failure is
//! fatal or merely logged.

use async_trait::async_trait;
use bytes::Bytes;
use docvault_storage::{BucketStatus, ObjectStore, StorageError, StorageResult};
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;

#[derive(Clone, Default)]
pub struct FailingObjectStore;

#[async_trait]
impl ObjectStore for FailingObjectStore {
    async fn upload(
        &self,
        object_key: &str,
        _content_type: &str,
        _data: Bytes,
    ) -> StorageResult<()> {
        Err(StorageError::UploadFailed(format!(
            "injected failure for key: {}",
            object_key
        )))
    }

    async fn download(&self, object_key: &str) -> StorageResult<Bytes> {
        Err(StorageError::DownloadFailed(format!(
            "injected failure for key: {}",
            object_key
        )))
    }

    async fn download_stream(
        &self,
        object_key: &str,
    ) -> StorageResult<Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>> {
        Err(StorageError::DownloadFailed(format!(
            "injected failure for key: {}",
            object_key
        )))
    }

    async fn delete_keys(&self, object_keys: &[String]) -> StorageResult<()> {
        Err(StorageError::DeleteFailed(format!(
            "injected failure for {} keys",
            object_keys.len()
        )))
    }

    async fn copy(&self, source_key: &str, _destination_key: &str) -> StorageResult<()> {
        Err(StorageError::CopyFailed(format!(
            "injected failure for key: {}",
            source_key
        )))
    }

    async fn cut(&self, source_key: &str, _destination_key: &str) -> StorageResult<()> {
        Err(StorageError::CopyFailed(format!(
            "injected failure for key: {}",
            source_key
        )))
    }

    async fn presigned_url(
        &self,
        _object_key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Err(StorageError::BackendError("injected failure".to_string()))
    }

    async fn downloadable_presigned_url(
        &self,
        _object_key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Err(StorageError::BackendError("injected failure".to_string()))
    }

    async fn exists(&self, _object_key: &str) -> StorageResult<bool> {
        Err(StorageError::BackendError("injected failure".to_string()))
    }

    async fn bucket_status(&self, _bucket_name: &str) -> BucketStatus {
        BucketStatus::Unknown(StorageError::BackendError(
            "injected failure".to_string(),
        ))
    }

    async fn list_keys(&self) -> StorageResult<Vec<String>> {
        Err(StorageError::BackendError("injected failure".to_string()))
    }
}
