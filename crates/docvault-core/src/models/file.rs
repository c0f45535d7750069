use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::folder::RecordStatus;

/// Durability state of the binary behind a file record. A row is created as
/// `PendingUpload` before the bucket write starts and moved to `Stored` or
/// `UploadFailed` when the write completes, so metadata never silently claims
/// bytes that were never made durable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "upload_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    PendingUpload,
    Stored,
    UploadFailed,
}

/// File metadata record. The `object_key` is the only linkage to the binary
/// payload in the bucket; folder attributes are denormalized at upload time so
/// listings never join against folder state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct VaultFile {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: String,
    pub filename: String,
    #[serde(skip_serializing)] // Hidden from public.
    pub object_key: String,
    pub content_type: String,
    pub classification: i64,
    pub smart_folder_id: Uuid,
    pub smart_folder_name: String,
    pub smart_folder_category: i64,
    pub smart_folder_sub_category: i64,
    pub status: RecordStatus,
    pub upload_status: UploadStatus,
    pub created_at: DateTime<Utc>,
    pub created_by_user_id: Uuid,
    pub created_by_user_name: String,
    pub updated_at: DateTime<Utc>,
}

/// Prepared row for a file insert. The caller resolves the folder snapshot
/// and builds the object key before handing this to the repository; the row
/// starts in `PendingUpload` until the bucket write is confirmed.
#[derive(Debug, Clone)]
pub struct NewVaultFile {
    pub tenant_id: Uuid,
    pub name: String,
    pub description: String,
    pub filename: String,
    pub object_key: String,
    pub content_type: String,
    pub classification: i64,
    pub smart_folder_id: Uuid,
    pub smart_folder_name: String,
    pub smart_folder_category: i64,
    pub smart_folder_sub_category: i64,
    pub created_by_user_id: Uuid,
    pub created_by_user_name: String,
}

/// Request DTO for accepting an upload into a smart folder
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFileRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, message = "missing value"))]
    pub filename: String,
    /// MIME type; derived from the filename extension when left empty.
    #[serde(default)]
    pub content_type: String,
    #[validate(range(min = 1, message = "missing value"))]
    pub classification: i64,
    pub smart_folder_id: Uuid,
}

/// Request DTO for updating a file record. `filename` is set only when the
/// caller also supplies replacement content; the object key is rewritten then.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFileRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1, message = "missing value"))]
    pub classification: i64,
    #[serde(default)]
    pub filename: Option<String>,
}
