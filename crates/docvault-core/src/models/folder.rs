use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Soft-delete lifecycle shared by folders, files and links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "record_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Archived,
}

/// Smart folder: a tenant-owned taxonomy node (category/sub-category) grouping
/// files. The category pair plus each file's classification determines the
/// object key of every file stored under the folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SmartFolder {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: String,
    pub category: i64,
    pub sub_category: i64,
    pub sort_number: i16,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub created_by_user_id: Uuid,
    pub created_by_user_name: String,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a smart folder
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSmartFolderRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Folder name must be between 1 and 255 characters"
    ))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1, message = "missing value"))]
    pub category: i64,
    #[validate(range(min = 1, message = "missing value"))]
    pub sub_category: i64,
    #[validate(range(min = 1, message = "missing value"))]
    pub sort_number: i16,
}
