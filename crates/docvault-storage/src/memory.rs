use crate::keys::validate_key;
use crate::traits::{BucketStatus, ObjectStore, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use docvault_core::CustomerKey;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Clone)]
struct StoredObject {
    data: Bytes,
    /// Digest of the customer key the object was written with, if any.
    key_digest: Option<String>,
}

/// In-memory object store for tests and local development
///
/// Mirrors the remote-service contracts the services rely on: idempotent
/// overwrite, not-found vs unreadable distinction, key-mismatch rejection for
/// encrypted objects, and presigned URLs that differ on every issuance.
#[derive(Clone)]
pub struct MemoryObjectStore {
    bucket: String,
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
    customer_key: Option<CustomerKey>,
    url_counter: Arc<AtomicU64>,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        MemoryObjectStore {
            bucket: bucket.into(),
            objects: Arc::new(Mutex::new(HashMap::new())),
            customer_key: None,
            url_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_customer_key(bucket: impl Into<String>, customer_key: CustomerKey) -> Self {
        MemoryObjectStore {
            customer_key: Some(customer_key),
            ..Self::new(bucket)
        }
    }

    /// A handle over the same bucket contents but presenting a different
    /// customer key (or none). Lets tests exercise mismatched-key reads.
    pub fn share_with_key(&self, customer_key: Option<CustomerKey>) -> Self {
        MemoryObjectStore {
            bucket: self.bucket.clone(),
            objects: Arc::clone(&self.objects),
            customer_key,
            url_counter: Arc::clone(&self.url_counter),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StoredObject>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn configured_digest(&self) -> Option<&str> {
        self.customer_key.as_ref().map(|k| k.key_md5_base64())
    }

    fn customer_key_matches(&self, stored: &StoredObject) -> bool {
        stored.key_digest.as_deref() == self.configured_digest()
    }

    fn fabricate_url(
        &self,
        object_key: &str,
        expires_in: Duration,
        attachment: bool,
    ) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let expires_at = (now + expires_in).as_secs();
        // Every issuance signs differently, like a real presigner.
        let signature = self.url_counter.fetch_add(1, Ordering::Relaxed);

        let mut url = format!(
            "memory://{}/{}?expires={}&signature={:016x}",
            self.bucket, object_key, expires_at, signature
        );
        if attachment {
            url.push_str("&response-content-disposition=attachment");
        }
        url
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        object_key: &str,
        _content_type: &str,
        data: Bytes,
    ) -> StorageResult<()> {
        validate_key(object_key)?;

        let stored = StoredObject {
            data,
            key_digest: self.configured_digest().map(str::to_string),
        };
        self.lock().insert(object_key.to_string(), stored);
        Ok(())
    }

    async fn download(&self, object_key: &str) -> StorageResult<Bytes> {
        validate_key(object_key)?;

        let objects = self.lock();
        let stored = objects
            .get(object_key)
            .ok_or_else(|| StorageError::NotFound(object_key.to_string()))?;
        if !self.customer_key_matches(stored) {
            return Err(StorageError::DownloadFailed(format!(
                "customer key mismatch for object: {}",
                object_key
            )));
        }
        Ok(stored.data.clone())
    }

    async fn download_stream(
        &self,
        object_key: &str,
    ) -> StorageResult<Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>> {
        let data = self.download(object_key).await?;
        Ok(Box::pin(futures::stream::iter(std::iter::once(Ok(data)))))
    }

    async fn delete_keys(&self, object_keys: &[String]) -> StorageResult<()> {
        let mut objects = self.lock();
        for key in object_keys {
            // Deleting an absent key succeeds, matching remote semantics.
            objects.remove(key);
        }
        Ok(())
    }

    async fn copy(&self, source_key: &str, destination_key: &str) -> StorageResult<()> {
        validate_key(destination_key)?;

        let mut objects = self.lock();
        let stored = objects
            .get(source_key)
            .ok_or_else(|| StorageError::NotFound(source_key.to_string()))?;
        if !self.customer_key_matches(stored) {
            return Err(StorageError::CopyFailed(format!(
                "customer key mismatch for object: {}",
                source_key
            )));
        }
        let duplicate = stored.clone();
        objects.insert(destination_key.to_string(), duplicate);
        Ok(())
    }

    async fn cut(&self, source_key: &str, destination_key: &str) -> StorageResult<()> {
        self.copy(source_key, destination_key).await?;
        self.lock().remove(source_key);
        Ok(())
    }

    async fn presigned_url(
        &self,
        object_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        // Signing is local; like a real presigner this does not probe the
        // object's existence.
        validate_key(object_key)?;
        Ok(self.fabricate_url(object_key, expires_in, false))
    }

    async fn downloadable_presigned_url(
        &self,
        object_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_key(object_key)?;
        Ok(self.fabricate_url(object_key, expires_in, true))
    }

    async fn exists(&self, object_key: &str) -> StorageResult<bool> {
        let objects = self.lock();
        match objects.get(object_key) {
            None => Ok(false),
            Some(stored) if self.customer_key_matches(stored) => Ok(true),
            // A head-probe with the wrong key is rejected, not "absent".
            Some(_) => Err(StorageError::BackendError(format!(
                "customer key mismatch for object: {}",
                object_key
            ))),
        }
    }

    async fn bucket_status(&self, bucket_name: &str) -> BucketStatus {
        if bucket_name == self.bucket {
            BucketStatus::Exists
        } else {
            BucketStatus::Missing
        }
    }

    async fn list_keys(&self) -> StorageResult<Vec<String>> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn test_key() -> CustomerKey {
        CustomerKey::from_key_bytes(b"01234567890123456789012345678901").unwrap()
    }

    fn other_key() -> CustomerKey {
        CustomerKey::from_key_bytes(b"abcdefghijklmnopqrstuvwxyz012345").unwrap()
    }

    #[tokio::test]
    async fn upload_download_round_trip() {
        let storage = MemoryObjectStore::with_customer_key("vault-test", test_key());
        let data = Bytes::from_static(b"encrypted payload");

        storage
            .upload("tenant/t/cat_2/subcat_3/class_5/a.pdf", "application/pdf", data.clone())
            .await
            .unwrap();

        let downloaded = storage
            .download("tenant/t/cat_2/subcat_3/class_5/a.pdf")
            .await
            .unwrap();
        assert_eq!(data, downloaded);
    }

    #[tokio::test]
    async fn upload_overwrites_existing_object() {
        let storage = MemoryObjectStore::new("vault-test");

        storage
            .upload("k/a.txt", "text/plain", Bytes::from_static(b"first"))
            .await
            .unwrap();
        storage
            .upload("k/a.txt", "text/plain", Bytes::from_static(b"second"))
            .await
            .unwrap();

        assert_eq!(
            storage.download("k/a.txt").await.unwrap(),
            Bytes::from_static(b"second")
        );
    }

    #[tokio::test]
    async fn download_with_wrong_key_fails() {
        let storage = MemoryObjectStore::with_customer_key("vault-test", test_key());
        storage
            .upload("k/secret.pdf", "application/pdf", Bytes::from_static(b"x"))
            .await
            .unwrap();

        let wrong = storage.share_with_key(Some(other_key()));
        assert!(matches!(
            wrong.download("k/secret.pdf").await,
            Err(StorageError::DownloadFailed(_))
        ));

        let none = storage.share_with_key(None);
        assert!(matches!(
            none.download("k/secret.pdf").await,
            Err(StorageError::DownloadFailed(_))
        ));

        // The identical key still reads the bytes back.
        assert!(storage.download("k/secret.pdf").await.is_ok());
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let storage = MemoryObjectStore::new("vault-test");
        assert!(matches!(
            storage.download("absent.txt").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(!storage.exists("absent.txt").await.unwrap());
    }

    #[tokio::test]
    async fn delete_keys_ignores_missing_members() {
        let storage = MemoryObjectStore::new("vault-test");
        storage
            .upload("k1", "text/plain", Bytes::from_static(b"1"))
            .await
            .unwrap();
        storage
            .upload("k3", "text/plain", Bytes::from_static(b"3"))
            .await
            .unwrap();

        storage
            .delete_keys(&["k1".to_string(), "k2".to_string(), "k3".to_string()])
            .await
            .unwrap();

        assert!(!storage.exists("k1").await.unwrap());
        assert!(!storage.exists("k3").await.unwrap());
    }

    #[tokio::test]
    async fn cut_moves_object() {
        let storage = MemoryObjectStore::new("vault-test");
        let data = Bytes::from_static(b"moving");
        storage.upload("src", "text/plain", data.clone()).await.unwrap();

        storage.cut("src", "dst").await.unwrap();

        assert!(!storage.exists("src").await.unwrap());
        assert!(storage.exists("dst").await.unwrap());
        assert_eq!(storage.download("dst").await.unwrap(), data);
    }

    #[tokio::test]
    async fn copy_leaves_source_untouched() {
        let storage = MemoryObjectStore::new("vault-test");
        storage
            .upload("src", "text/plain", Bytes::from_static(b"dup"))
            .await
            .unwrap();

        storage.copy("src", "dst").await.unwrap();

        assert!(storage.exists("src").await.unwrap());
        assert!(storage.exists("dst").await.unwrap());
    }

    #[tokio::test]
    async fn presigned_urls_are_distinct_per_issuance() {
        let storage = MemoryObjectStore::new("vault-test");
        storage
            .upload("k/a.pdf", "application/pdf", Bytes::from_static(b"x"))
            .await
            .unwrap();

        let first = storage
            .presigned_url("k/a.pdf", Duration::from_secs(300))
            .await
            .unwrap();
        let second = storage
            .presigned_url("k/a.pdf", Duration::from_secs(300))
            .await
            .unwrap();

        assert_ne!(first, second);
        assert!(first.contains("expires="));

        let download = storage
            .downloadable_presigned_url("k/a.pdf", Duration::from_secs(300))
            .await
            .unwrap();
        assert!(download.contains("response-content-disposition=attachment"));
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let storage = MemoryObjectStore::new("vault-test");
        assert!(matches!(
            storage
                .upload("../escape", "text/plain", Bytes::from_static(b"x"))
                .await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            storage.download("/absolute").await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn bucket_probe_distinguishes_own_bucket() {
        let storage = MemoryObjectStore::new("vault-test");
        assert!(storage.bucket_status("vault-test").await.is_exists());
        assert!(matches!(
            storage.bucket_status("other").await,
            BucketStatus::Missing
        ));
    }

    #[tokio::test]
    async fn stream_download_yields_full_content() {
        let storage = MemoryObjectStore::new("vault-test");
        let data = Bytes::from_static(b"stream me");
        storage.upload("k/s.bin", "application/octet-stream", data.clone())
            .await
            .unwrap();

        let mut stream = storage.download_stream("k/s.bin").await.unwrap();
        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, data);
    }
}
