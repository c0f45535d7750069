//! Ready-made model instances for tests.
//!
//! The folder fixture lives at category 2 / sub-category 3 unless told
//! otherwise, and the file fixture builds its object key for that same pair,
//! so fixtures compose without extra wiring.

use chrono::{DateTime, Utc};
use docvault_core::models::{RecordStatus, ShareLink, SmartFolder, UploadStatus, VaultFile};
use docvault_storage::object_key;
use uuid::Uuid;

pub fn folder_fixture(tenant_id: Uuid, category: i64, sub_category: i64) -> SmartFolder {
    let now = Utc::now();
    SmartFolder {
        id: Uuid::new_v4(),
        tenant_id,
        name: "Tax Returns".to_string(),
        description: String::new(),
        category,
        sub_category,
        sort_number: 1,
        status: RecordStatus::Active,
        created_at: now,
        created_by_user_id: Uuid::new_v4(),
        created_by_user_name: "bob".to_string(),
        updated_at: now,
    }
}

pub fn file_fixture(
    tenant_id: Uuid,
    smart_folder_id: Uuid,
    filename: &str,
    upload_status: UploadStatus,
) -> VaultFile {
    let now = Utc::now();
    VaultFile {
        id: Uuid::new_v4(),
        tenant_id,
        name: filename.to_string(),
        description: String::new(),
        filename: filename.to_string(),
        object_key: object_key(tenant_id, 2, 3, 1, filename),
        content_type: "application/pdf".to_string(),
        classification: 1,
        smart_folder_id,
        smart_folder_name: "Tax Returns".to_string(),
        smart_folder_category: 2,
        smart_folder_sub_category: 3,
        status: RecordStatus::Active,
        upload_status,
        created_at: now,
        created_by_user_id: Uuid::new_v4(),
        created_by_user_name: "bob".to_string(),
        updated_at: now,
    }
}

pub fn link_fixture(
    tenant_id: Uuid,
    smart_folder_id: Uuid,
    expiry_date: DateTime<Utc>,
) -> ShareLink {
    let now = Utc::now();
    ShareLink {
        id: Uuid::new_v4(),
        tenant_id,
        tenant_name: "Acme".to_string(),
        smart_folder_id,
        smart_folder_name: "Tax Returns".to_string(),
        smart_folder_category: 2,
        smart_folder_sub_category: 3,
        smart_folder_description: String::new(),
        expires_in: 24,
        expiry_date,
        status: RecordStatus::Active,
        created_at: now,
        created_by_user_id: Uuid::new_v4(),
        created_by_user_name: "bob".to_string(),
    }
}
