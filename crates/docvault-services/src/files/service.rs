//! Vault file lifecycle: upload, replace, delete, fetch and reconciliation.
//!
//! Every flow keeps the metadata row honest about durability: a row is
//! inserted as `PendingUpload`, flipped to `Stored` or `UploadFailed` once
//! the bucket write settles, and swept by [`VaultFileService::reconcile_pending`]
//! when a crash leaves it in between.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use docvault_core::{
    models::{CreateFileRequest, NewVaultFile, UpdateFileRequest, UploadStatus, VaultFile},
    AppError,
};
use docvault_db::{SmartFolderRepositoryTrait, VaultFileRepositoryTrait};
use docvault_storage::{
    find_matching_key, is_canonical_key, object_key, validate_key, ObjectStore, StorageError,
};
use futures::TryStreamExt;
use uuid::Uuid;
use validator::Validate;

/// Lifetime of attachment-disposition URLs handed to authenticated callers.
pub const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// A fetched object with the name and type a caller needs to serve it.
#[derive(Debug)]
pub struct FileContent {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Orchestrates file metadata and the object store together.
#[derive(Clone)]
pub struct VaultFileService {
    folders: Arc<dyn SmartFolderRepositoryTrait>,
    files: Arc<dyn VaultFileRepositoryTrait>,
    storage: Arc<dyn ObjectStore>,
}

impl VaultFileService {
    pub fn new(
        folders: Arc<dyn SmartFolderRepositoryTrait>,
        files: Arc<dyn VaultFileRepositoryTrait>,
        storage: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            folders,
            files,
            storage,
        }
    }

    /// Accept an upload into a folder.
    ///
    /// The metadata row is inserted before the bucket write and only claims
    /// `Stored` once the write returns; an upload error leaves the row in
    /// `UploadFailed` and surfaces the storage error.
    pub async fn create_file(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        user_name: String,
        request: CreateFileRequest,
        content: Bytes,
    ) -> Result<VaultFile, AppError> {
        request.validate()?;

        let folder = self
            .folders
            .get_folder(tenant_id, request.smart_folder_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "smart folder does not exist for id: {}",
                    request.smart_folder_id
                ))
            })?;

        let content_type = if request.content_type.is_empty() {
            content_type_for(&request.filename).to_string()
        } else {
            request.content_type.clone()
        };

        let key = object_key(
            tenant_id,
            folder.category,
            folder.sub_category,
            request.classification,
            &request.filename,
        );
        validate_key(&key)?;

        let mut file = self
            .files
            .create_file(NewVaultFile {
                tenant_id,
                name: request.name,
                description: request.description,
                filename: request.filename,
                object_key: key,
                content_type,
                classification: request.classification,
                smart_folder_id: folder.id,
                smart_folder_name: folder.name,
                smart_folder_category: folder.category,
                smart_folder_sub_category: folder.sub_category,
                created_by_user_id: user_id,
                created_by_user_name: user_name,
            })
            .await?;

        let size_bytes = content.len();
        match self
            .storage
            .upload(&file.object_key, &file.content_type, content)
            .await
        {
            Ok(()) => {
                self.files
                    .set_upload_status(tenant_id, file.id, UploadStatus::Stored)
                    .await?;
                file.upload_status = UploadStatus::Stored;
                tracing::info!(
                    file_id = %file.id,
                    object_key = %file.object_key,
                    size_bytes,
                    "vault file stored"
                );
                Ok(file)
            }
            Err(upload_err) => {
                if let Err(status_err) = self
                    .files
                    .set_upload_status(tenant_id, file.id, UploadStatus::UploadFailed)
                    .await
                {
                    // The reconciliation sweep will settle this row later.
                    tracing::error!(
                        file_id = %file.id,
                        error = %status_err,
                        "failed to record upload failure"
                    );
                }
                tracing::error!(
                    file_id = %file.id,
                    object_key = %file.object_key,
                    error = %upload_err,
                    "vault file upload failed"
                );
                Err(upload_err.into())
            }
        }
    }

    /// Update a file's metadata, optionally replacing its content.
    ///
    /// A replacement must carry both the new bytes and the new filename; the
    /// old object is deleted best-effort, then the row is rewritten with the
    /// new key and the new bytes are uploaded under the usual status flow.
    pub async fn update_file(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        request: UpdateFileRequest,
        content: Option<Bytes>,
    ) -> Result<VaultFile, AppError> {
        request.validate()?;

        let file = self.files.get_file(tenant_id, id).await?.ok_or_else(|| {
            AppError::NotFound(format!("vault file does not exist for id: {}", id))
        })?;

        let (content, filename) = match (content, request.filename.clone()) {
            (Some(content), Some(filename)) => (content, filename),
            (None, None) => {
                return self
                    .files
                    .update_metadata(
                        tenant_id,
                        id,
                        request.name,
                        request.description,
                        request.classification,
                    )
                    .await;
            }
            (Some(_), None) => {
                return Err(AppError::BadRequest(
                    "filename is required when replacing content".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(AppError::BadRequest(
                    "replacement content is required when changing the filename".to_string(),
                ));
            }
        };

        // The old object may already be gone (removed in the bucket directly
        // or by an earlier replacement attempt), so a failure here only logs.
        if let Err(e) = self.storage.delete_keys(&[file.object_key.clone()]).await {
            tracing::warn!(
                file_id = %id,
                object_key = %file.object_key,
                error = %e,
                "could not delete previous object before replacement"
            );
        }

        let content_type = content_type_for(&filename).to_string();
        let key = object_key(
            tenant_id,
            file.smart_folder_category,
            file.smart_folder_sub_category,
            request.classification,
            &filename,
        );
        validate_key(&key)?;

        let mut updated = self
            .files
            .replace_object(
                tenant_id,
                id,
                request.name,
                request.description,
                request.classification,
                filename,
                content_type,
                key,
            )
            .await?;

        let size_bytes = content.len();
        match self
            .storage
            .upload(&updated.object_key, &updated.content_type, content)
            .await
        {
            Ok(()) => {
                self.files
                    .set_upload_status(tenant_id, id, UploadStatus::Stored)
                    .await?;
                updated.upload_status = UploadStatus::Stored;
                tracing::info!(
                    file_id = %id,
                    object_key = %updated.object_key,
                    size_bytes,
                    "vault file content replaced"
                );
                Ok(updated)
            }
            Err(upload_err) => {
                if let Err(status_err) = self
                    .files
                    .set_upload_status(tenant_id, id, UploadStatus::UploadFailed)
                    .await
                {
                    tracing::error!(
                        file_id = %id,
                        error = %status_err,
                        "failed to record upload failure"
                    );
                }
                tracing::error!(
                    file_id = %id,
                    object_key = %updated.object_key,
                    error = %upload_err,
                    "replacement upload failed"
                );
                Err(upload_err.into())
            }
        }
    }

    pub async fn get_file(&self, tenant_id: Uuid, id: Uuid) -> Result<VaultFile, AppError> {
        self.files.get_file(tenant_id, id).await?.ok_or_else(|| {
            AppError::NotFound(format!("vault file does not exist for id: {}", id))
        })
    }

    pub async fn list_files_by_folder(
        &self,
        tenant_id: Uuid,
        smart_folder_id: Uuid,
    ) -> Result<Vec<VaultFile>, AppError> {
        self.files
            .list_files_by_folder(tenant_id, smart_folder_id)
            .await
    }

    /// Delete a file: best-effort object removal, then the metadata row.
    /// Metadata is authoritative, so a bucket failure never blocks the
    /// delete.
    pub async fn delete_file(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let file = self.files.get_file(tenant_id, id).await?.ok_or_else(|| {
            AppError::NotFound(format!("vault file does not exist for id: {}", id))
        })?;

        if let Err(e) = self.storage.delete_keys(&[file.object_key.clone()]).await {
            tracing::warn!(
                file_id = %id,
                object_key = %file.object_key,
                error = %e,
                "object delete failed, removing metadata anyway"
            );
        }

        self.files.delete_file(tenant_id, id).await?;
        tracing::info!(file_id = %id, tenant_id = %tenant_id, "vault file deleted");
        Ok(())
    }

    /// Delete a folder: bulk-delete every referenced object best-effort,
    /// remove the file rows, then archive the folder itself.
    pub async fn delete_folder(&self, tenant_id: Uuid, smart_folder_id: Uuid) -> Result<(), AppError> {
        let folder = self
            .folders
            .get_folder(tenant_id, smart_folder_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "smart folder does not exist for id: {}",
                    smart_folder_id
                ))
            })?;

        let files = self
            .files
            .list_files_by_folder(tenant_id, smart_folder_id)
            .await?;
        let object_keys: Vec<String> = files.into_iter().map(|f| f.object_key).collect();

        if !object_keys.is_empty() {
            if let Err(e) = self.storage.delete_keys(&object_keys).await {
                tracing::warn!(
                    smart_folder_id = %smart_folder_id,
                    key_count = object_keys.len(),
                    error = %e,
                    "folder object cleanup incomplete, removing metadata anyway"
                );
            }
        }

        let removed = self
            .files
            .delete_files_by_folder(tenant_id, smart_folder_id)
            .await?;
        self.folders.archive_folder(tenant_id, folder.id).await?;

        tracing::info!(
            smart_folder_id = %smart_folder_id,
            tenant_id = %tenant_id,
            files_removed = removed,
            "smart folder deleted"
        );
        Ok(())
    }

    /// An attachment-disposition URL for an authenticated caller.
    pub async fn downloadable_url(&self, tenant_id: Uuid, id: Uuid) -> Result<String, AppError> {
        let file = self.files.get_file(tenant_id, id).await?.ok_or_else(|| {
            AppError::NotFound(format!("vault file does not exist for id: {}", id))
        })?;

        if file.upload_status != UploadStatus::Stored {
            return Err(AppError::NotFound(format!(
                "vault file content is not stored for id: {}",
                id
            )));
        }

        let url = self
            .storage
            .downloadable_presigned_url(&file.object_key, DOWNLOAD_URL_TTL)
            .await?;
        Ok(url)
    }

    /// Fetch a file's bytes, naming and typing them for the caller.
    ///
    /// The filename comes from the resolved key and the content type from
    /// its extension. When a pre-canonical key misses on the direct read,
    /// the bucket listing is scanned for a substring match before giving up.
    pub async fn fetch_content(&self, tenant_id: Uuid, id: Uuid) -> Result<FileContent, AppError> {
        let file = self.files.get_file(tenant_id, id).await?.ok_or_else(|| {
            AppError::NotFound(format!("vault file does not exist for id: {}", id))
        })?;

        let (resolved_key, data) = match self.collect(&file.object_key).await {
            Ok(data) => (file.object_key.clone(), data),
            Err(StorageError::NotFound(_)) if !is_canonical_key(&file.object_key) => {
                let listing = self.storage.list_keys().await?;
                let matched = find_matching_key(&listing, &file.object_key)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        StorageError::NotFound(file.object_key.clone())
                    })?;
                tracing::warn!(
                    file_id = %id,
                    stored_key = %file.object_key,
                    matched_key = %matched,
                    "resolved legacy object key through bucket listing"
                );
                let data = self.collect(&matched).await?;
                (matched, data)
            }
            Err(e) => return Err(e.into()),
        };

        let filename = resolved_key
            .rsplit('/')
            .next()
            .unwrap_or(&file.filename)
            .to_string();
        let content_type = content_type_for(&filename).to_string();

        Ok(FileContent {
            filename,
            content_type,
            data,
        })
    }

    /// Settle rows stuck in `PendingUpload` since before `older_than` by
    /// probing the bucket: the object is either there or it is not. Probe
    /// errors leave the row for the next sweep. Returns how many rows were
    /// settled.
    pub async fn reconcile_pending(&self, older_than: DateTime<Utc>) -> Result<u64, AppError> {
        let stuck = self.files.list_pending_uploads(older_than).await?;
        let mut settled = 0;

        for file in stuck {
            let status = match self.storage.exists(&file.object_key).await {
                Ok(true) => UploadStatus::Stored,
                Ok(false) => UploadStatus::UploadFailed,
                Err(e) => {
                    tracing::warn!(
                        file_id = %file.id,
                        object_key = %file.object_key,
                        error = %e,
                        "could not probe pending upload, leaving for next sweep"
                    );
                    continue;
                }
            };

            self.files
                .set_upload_status(file.tenant_id, file.id, status)
                .await?;
            tracing::info!(
                file_id = %file.id,
                object_key = %file.object_key,
                ?status,
                "reconciled pending upload"
            );
            settled += 1;
        }

        Ok(settled)
    }

    /// Stream an object and gather it into one buffer.
    async fn collect(&self, object_key: &str) -> Result<Bytes, StorageError> {
        let mut stream = self.storage.download_stream(object_key).await?;
        let mut data = BytesMut::new();
        while let Some(chunk) = stream.try_next().await? {
            data.extend_from_slice(&chunk);
        }
        Ok(data.freeze())
    }
}

/// MIME type for a filename, by extension. Unknown or missing extensions
/// fall back to `application/octet-stream`.
fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit_once('.') {
        Some((_, ext)) => match ext.to_ascii_lowercase().as_str() {
            "pdf" => "application/pdf",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "txt" => "text/plain",
            "csv" => "text/csv",
            "doc" => "application/msword",
            "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "xls" => "application/vnd.ms-excel",
            "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "zip" => "application/zip",
            _ => "application/octet-stream",
        },
        None => "application/octet-stream",
    }
}
