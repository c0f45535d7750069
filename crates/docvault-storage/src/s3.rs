use crate::traits::{BucketStatus, ObjectStore, StorageError, StorageResult};
use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use bytes::Bytes;
use docvault_core::{Config, CustomerKey};
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;

/// SSE-C algorithm attached to every read/write of an encrypted object.
const SSE_CUSTOMER_ALGORITHM: &str = "AES256";

/// Bulk delete against a remote service must not hang request tasks.
pub const BULK_DELETE_TIMEOUT: Duration = Duration::from_secs(15);

/// Copy and move need two round-trips, so they get a longer budget.
pub const COPY_TIMEOUT: Duration = Duration::from_secs(60);

/// S3-compatible object store implementation
///
/// Works against AWS S3 as well as third-party providers (MinIO, DigitalOcean
/// Spaces) through a custom endpoint. When a customer key is configured, the
/// same SSE-C parameter triple is attached to every object operation.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    customer_key: Option<CustomerKey>,
}

impl S3ObjectStore {
    /// Connect to the configured bucket and verify it is reachable.
    ///
    /// Probes the bucket before returning: a missing or unreachable bucket is
    /// a startup-fatal configuration error, with the two causes reported
    /// distinctly.
    pub async fn connect(config: &Config) -> StorageResult<Self> {
        tracing::debug!("object storage initializing...");

        let region = config.s3_region.clone().ok_or_else(|| {
            StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
        })?;

        let mut loader =
            aws_config::defaults(aws_config::BehaviorVersion::latest()).region(Region::new(region));
        if let (Some(access_key), Some(secret_key)) = (
            config.s3_access_key_id.clone(),
            config.s3_secret_access_key.clone(),
        ) {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "docvault-static",
            ));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(ref endpoint) = config.s3_endpoint {
            // Third-party S3-compatible providers generally require
            // path-style addressing.
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        let customer_key = config
            .customer_key()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let store = S3ObjectStore {
            client,
            bucket: config.s3_bucket.clone(),
            customer_key,
        };

        match store.bucket_status(&store.bucket).await {
            BucketStatus::Exists => {}
            BucketStatus::Missing => {
                return Err(StorageError::ConfigError(format!(
                    "bucket {} does not exist",
                    store.bucket
                )));
            }
            BucketStatus::Unknown(err) => {
                return Err(StorageError::ConfigError(format!(
                    "bucket {} is unreachable: {}",
                    store.bucket, err
                )));
            }
        }

        tracing::debug!(
            bucket = %store.bucket,
            encrypted = store.customer_key.is_some(),
            "object storage ready"
        );

        Ok(store)
    }

    /// Copy without a timeout wrapper; `copy` and `cut` apply their budgets.
    async fn copy_object(&self, source_key: &str, destination_key: &str) -> StorageResult<()> {
        // CopySource is "{bucket}/{key}" with the key URL-encoded.
        let copy_source = format!("{}/{}", self.bucket, urlencoding::encode(source_key));

        let mut request = self
            .client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(copy_source)
            .key(destination_key);
        if let Some(ref key) = self.customer_key {
            // The source is read and the destination written with the same
            // customer key, so both sides of the copy carry the triple.
            request = request
                .copy_source_sse_customer_algorithm(SSE_CUSTOMER_ALGORITHM)
                .copy_source_sse_customer_key(key.key_base64())
                .copy_source_sse_customer_key_md5(key.key_md5_base64())
                .sse_customer_algorithm(SSE_CUSTOMER_ALGORITHM)
                .sse_customer_key(key.key_base64())
                .sse_customer_key_md5(key.key_md5_base64());
        }

        request.send().await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                source_key = %source_key,
                destination_key = %destination_key,
                "S3 copy failed"
            );
            StorageError::CopyFailed(e.to_string())
        })?;

        Ok(())
    }

    async fn delete_object(&self, object_key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(object_key)
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(
        &self,
        object_key: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<()> {
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(object_key)
            .content_type(content_type)
            .body(ByteStream::from(data));
        if let Some(ref key) = self.customer_key {
            request = request
                .sse_customer_algorithm(SSE_CUSTOMER_ALGORITHM)
                .sse_customer_key(key.key_base64())
                .sse_customer_key_md5(key.key_md5_base64());
        }

        request.send().await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %object_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %object_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn download(&self, object_key: &str) -> StorageResult<Bytes> {
        let mut request = self.client.get_object().bucket(&self.bucket).key(object_key);
        if let Some(ref key) = self.customer_key {
            request = request
                .sse_customer_algorithm(SSE_CUSTOMER_ALGORITHM)
                .sse_customer_key(key.key_base64())
                .sse_customer_key_md5(key.key_md5_base64());
        }

        let output = match request.send().await {
            Ok(output) => output,
            Err(SdkError::ServiceError(context)) if context.err().is_no_such_key() => {
                return Err(StorageError::NotFound(object_key.to_string()));
            }
            Err(err) => return Err(StorageError::DownloadFailed(err.to_string())),
        };

        let collected = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        Ok(collected.into_bytes())
    }

    async fn download_stream(
        &self,
        object_key: &str,
    ) -> StorageResult<Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>> {
        let mut request = self.client.get_object().bucket(&self.bucket).key(object_key);
        if let Some(ref key) = self.customer_key {
            request = request
                .sse_customer_algorithm(SSE_CUSTOMER_ALGORITHM)
                .sse_customer_key(key.key_base64())
                .sse_customer_key_md5(key.key_md5_base64());
        }

        let output = match request.send().await {
            Ok(output) => output,
            Err(SdkError::ServiceError(context)) if context.err().is_no_such_key() => {
                return Err(StorageError::NotFound(object_key.to_string()));
            }
            Err(err) => return Err(StorageError::DownloadFailed(err.to_string())),
        };

        let stream = futures::stream::try_unfold(output.body, |mut body| async move {
            match body.try_next().await {
                Ok(Some(chunk)) => Ok(Some((chunk, body))),
                Ok(None) => Ok(None),
                Err(e) => Err(StorageError::DownloadFailed(e.to_string())),
            }
        });

        Ok(Box::pin(stream))
    }

    async fn delete_keys(&self, object_keys: &[String]) -> StorageResult<()> {
        if object_keys.is_empty() {
            return Ok(());
        }

        let start = std::time::Instant::now();

        let mut identifiers = Vec::with_capacity(object_keys.len());
        for key in object_keys {
            let identifier = ObjectIdentifier::builder()
                .key(key)
                .build()
                .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;
            identifiers.push(identifier);
        }
        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .build()
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        let request = self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send();

        let output = match tokio::time::timeout(BULK_DELETE_TIMEOUT, request).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                tracing::error!(
                    error = %err,
                    bucket = %self.bucket,
                    key_count = object_keys.len(),
                    "S3 bulk delete failed"
                );
                return Err(StorageError::DeleteFailed(err.to_string()));
            }
            Err(_) => {
                return Err(StorageError::Timeout {
                    operation: "bulk delete",
                    seconds: BULK_DELETE_TIMEOUT.as_secs(),
                });
            }
        };

        // Per-object failures come back in the response body, not as a
        // request error; fold them into one aggregate outcome.
        let failures = output.errors();
        if !failures.is_empty() {
            let detail = failures
                .iter()
                .map(|e| {
                    format!(
                        "{}: {}",
                        e.key().unwrap_or("<unknown key>"),
                        e.message().or(e.code()).unwrap_or("unknown error")
                    )
                })
                .collect::<Vec<_>>()
                .join("; ");
            tracing::error!(
                bucket = %self.bucket,
                failed = failures.len(),
                requested = object_keys.len(),
                "S3 bulk delete partially failed"
            );
            return Err(StorageError::DeleteFailed(format!(
                "{} of {} objects not deleted: {}",
                failures.len(),
                object_keys.len(),
                detail
            )));
        }

        tracing::info!(
            bucket = %self.bucket,
            key_count = object_keys.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 bulk delete successful"
        );

        Ok(())
    }

    async fn copy(&self, source_key: &str, destination_key: &str) -> StorageResult<()> {
        match tokio::time::timeout(COPY_TIMEOUT, self.copy_object(source_key, destination_key))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(StorageError::Timeout {
                    operation: "copy",
                    seconds: COPY_TIMEOUT.as_secs(),
                });
            }
        }

        tracing::info!(
            source_key = %source_key,
            destination_key = %destination_key,
            "S3 copy successful"
        );

        Ok(())
    }

    async fn cut(&self, source_key: &str, destination_key: &str) -> StorageResult<()> {
        // One budget spans both round-trips, like a caller-scoped deadline.
        let operation = async {
            self.copy_object(source_key, destination_key).await?;

            self.delete_object(source_key).await.map_err(|e| {
                tracing::error!(
                    error = %e,
                    source_key = %source_key,
                    destination_key = %destination_key,
                    "S3 move copied but failed to delete source"
                );
                StorageError::MoveIncomplete(format!(
                    "copied {} to {} but source delete failed: {}",
                    source_key, destination_key, e
                ))
            })
        };

        match tokio::time::timeout(COPY_TIMEOUT, operation).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(StorageError::Timeout {
                    operation: "move",
                    seconds: COPY_TIMEOUT.as_secs(),
                });
            }
        }

        tracing::info!(
            source_key = %source_key,
            destination_key = %destination_key,
            "S3 move successful"
        );

        Ok(())
    }

    async fn presigned_url(
        &self,
        object_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let mut request = self.client.get_object().bucket(&self.bucket).key(object_key);
        if let Some(ref key) = self.customer_key {
            request = request
                .sse_customer_algorithm(SSE_CUSTOMER_ALGORITHM)
                .sse_customer_key(key.key_base64())
                .sse_customer_key_md5(key.key_md5_base64());
        }

        let config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        let presigned = request
            .presigned(config)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    async fn downloadable_presigned_url(
        &self,
        object_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let mut request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(object_key)
            // Forces the browser to download instead of rendering inline.
            .response_content_disposition("attachment");
        if let Some(ref key) = self.customer_key {
            request = request
                .sse_customer_algorithm(SSE_CUSTOMER_ALGORITHM)
                .sse_customer_key(key.key_base64())
                .sse_customer_key_md5(key.key_md5_base64());
        }

        let config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        let presigned = request
            .presigned(config)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    async fn exists(&self, object_key: &str) -> StorageResult<bool> {
        let mut request = self.client.head_object().bucket(&self.bucket).key(object_key);
        if let Some(ref key) = self.customer_key {
            // HEAD on an encrypted object without its key is rejected
            // outright, not reported as absent.
            request = request
                .sse_customer_algorithm(SSE_CUSTOMER_ALGORITHM)
                .sse_customer_key(key.key_base64())
                .sse_customer_key_md5(key.key_md5_base64());
        }

        match request.send().await {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(context)) if context.err().is_not_found() => Ok(false),
            Err(err) => Err(StorageError::BackendError(err.to_string())),
        }
    }

    async fn bucket_status(&self, bucket_name: &str) -> BucketStatus {
        match self
            .client
            .head_bucket()
            .bucket(bucket_name)
            .send()
            .await
        {
            Ok(_) => BucketStatus::Exists,
            Err(SdkError::ServiceError(context)) if context.err().is_not_found() => {
                BucketStatus::Missing
            }
            Err(err) => BucketStatus::Unknown(StorageError::BackendError(err.to_string())),
        }
    }

    async fn list_keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| StorageError::BackendError(e.to_string()))?;
            for object in page.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }
        }

        Ok(keys)
    }
}

// Presigning is pure SigV4 arithmetic, so it is testable without a bucket:
// a client with static credentials signs locally.
#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(customer_key: Option<CustomerKey>) -> S3ObjectStore {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "static"))
            .build();
        S3ObjectStore {
            client: Client::from_conf(config),
            bucket: "vault-test".to_string(),
            customer_key,
        }
    }

    #[tokio::test]
    async fn presigned_url_carries_requested_expiry() {
        let store = test_store(None);
        let url = store
            .presigned_url("tenant/t/cat_2/subcat_3/class_5/a.pdf", Duration::from_secs(300))
            .await
            .unwrap();

        assert!(url.contains("X-Amz-Expires=300"), "url was: {}", url);
        assert!(url.contains("tenant/t/cat_2/subcat_3/class_5/a.pdf"));
    }

    #[tokio::test]
    async fn downloadable_url_signs_the_attachment_disposition() {
        let store = test_store(None);
        let url = store
            .downloadable_presigned_url("k/a.pdf", Duration::from_secs(900))
            .await
            .unwrap();

        assert!(url.contains("X-Amz-Expires=900"), "url was: {}", url);
        assert!(url.contains("response-content-disposition=attachment"));
    }

    #[tokio::test]
    async fn encrypted_presigned_url_signs_the_customer_key_headers() {
        let key = CustomerKey::from_key_bytes(b"01234567890123456789012345678901").unwrap();
        let store = test_store(Some(key));
        let url = store
            .presigned_url("k/secret.pdf", Duration::from_secs(300))
            .await
            .unwrap();

        // The SSE-C triple rides along as signed headers, so a URL consumer
        // must present the same key material the signer promised.
        assert!(
            url.contains("x-amz-server-side-encryption-customer-algorithm"),
            "url was: {}",
            url
        );
    }
}
