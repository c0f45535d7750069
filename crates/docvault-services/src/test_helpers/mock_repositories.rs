//! Mock repository implementations for testing
//!
//! These mocks allow testing services without database dependencies. They
//! share state through `Arc<Mutex<..>>` maps keyed by `(tenant_id, id)`, so a
//! clone observes every write made through any other clone.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docvault_core::{
    models::{
        CreateLinkRequest, CreateSmartFolderRequest, NewVaultFile, RecordStatus, ShareLink,
        SmartFolder, UploadStatus, VaultFile,
    },
    AppError,
};
use docvault_db::{ShareLinkRepositoryTrait, SmartFolderRepositoryTrait, VaultFileRepositoryTrait};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Mock smart folder repository for testing without a database
#[derive(Clone, Default)]
pub struct MockSmartFolderRepository {
    folders: Arc<Mutex<HashMap<(Uuid, Uuid), SmartFolder>>>,
}

impl MockSmartFolderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_folder(&self, folder: SmartFolder) {
        self.folders
            .lock()
            .unwrap()
            .insert((folder.tenant_id, folder.id), folder);
    }
}

#[async_trait]
impl SmartFolderRepositoryTrait for MockSmartFolderRepository {
    async fn create_folder(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        user_name: String,
        request: CreateSmartFolderRequest,
    ) -> Result<SmartFolder, AppError> {
        let now = Utc::now();
        let folder = SmartFolder {
            id: Uuid::new_v4(),
            tenant_id,
            name: request.name,
            description: request.description,
            category: request.category,
            sub_category: request.sub_category,
            sort_number: request.sort_number,
            status: RecordStatus::Active,
            created_at: now,
            created_by_user_id: user_id,
            created_by_user_name: user_name,
            updated_at: now,
        };
        self.add_folder(folder.clone());
        Ok(folder)
    }

    async fn get_folder(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<SmartFolder>, AppError> {
        Ok(self
            .folders
            .lock()
            .unwrap()
            .get(&(tenant_id, id))
            .filter(|f| f.status == RecordStatus::Active)
            .cloned())
    }

    async fn list_folders(&self, tenant_id: Uuid) -> Result<Vec<SmartFolder>, AppError> {
        let mut folders: Vec<SmartFolder> = self
            .folders
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.tenant_id == tenant_id && f.status == RecordStatus::Active)
            .cloned()
            .collect();
        folders.sort_by(|a, b| {
            a.sort_number
                .cmp(&b.sort_number)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(folders)
    }

    async fn archive_folder(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut folders = self.folders.lock().unwrap();
        match folders.get_mut(&(tenant_id, id)) {
            Some(folder) if folder.status == RecordStatus::Active => {
                folder.status = RecordStatus::Archived;
                folder.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Mock vault file repository for testing without a database
#[derive(Clone, Default)]
pub struct MockVaultFileRepository {
    files: Arc<Mutex<HashMap<(Uuid, Uuid), VaultFile>>>,
}

impl MockVaultFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, file: VaultFile) {
        self.files
            .lock()
            .unwrap()
            .insert((file.tenant_id, file.id), file);
    }
}

#[async_trait]
impl VaultFileRepositoryTrait for MockVaultFileRepository {
    async fn create_file(&self, input: NewVaultFile) -> Result<VaultFile, AppError> {
        let now = Utc::now();
        let file = VaultFile {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            name: input.name,
            description: input.description,
            filename: input.filename,
            object_key: input.object_key,
            content_type: input.content_type,
            classification: input.classification,
            smart_folder_id: input.smart_folder_id,
            smart_folder_name: input.smart_folder_name,
            smart_folder_category: input.smart_folder_category,
            smart_folder_sub_category: input.smart_folder_sub_category,
            status: RecordStatus::Active,
            upload_status: UploadStatus::PendingUpload,
            created_at: now,
            created_by_user_id: input.created_by_user_id,
            created_by_user_name: input.created_by_user_name,
            updated_at: now,
        };
        self.add_file(file.clone());
        Ok(file)
    }

    async fn get_file(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<VaultFile>, AppError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(&(tenant_id, id))
            .filter(|f| f.status == RecordStatus::Active)
            .cloned())
    }

    async fn list_files_by_folder(
        &self,
        tenant_id: Uuid,
        smart_folder_id: Uuid,
    ) -> Result<Vec<VaultFile>, AppError> {
        let mut files: Vec<VaultFile> = self
            .files
            .lock()
            .unwrap()
            .values()
            .filter(|f| {
                f.tenant_id == tenant_id
                    && f.smart_folder_id == smart_folder_id
                    && f.status == RecordStatus::Active
            })
            .cloned()
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files)
    }

    async fn set_upload_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        upload_status: UploadStatus,
    ) -> Result<(), AppError> {
        if let Some(file) = self.files.lock().unwrap().get_mut(&(tenant_id, id)) {
            file.upload_status = upload_status;
            file.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_metadata(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        name: String,
        description: String,
        classification: i64,
    ) -> Result<VaultFile, AppError> {
        let mut files = self.files.lock().unwrap();
        let file = files.get_mut(&(tenant_id, id)).ok_or_else(|| {
            AppError::NotFound(format!("vault file does not exist for id: {}", id))
        })?;
        file.name = name;
        file.description = description;
        file.classification = classification;
        file.updated_at = Utc::now();
        Ok(file.clone())
    }

    async fn replace_object(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        name: String,
        description: String,
        classification: i64,
        filename: String,
        content_type: String,
        object_key: String,
    ) -> Result<VaultFile, AppError> {
        let mut files = self.files.lock().unwrap();
        let file = files.get_mut(&(tenant_id, id)).ok_or_else(|| {
            AppError::NotFound(format!("vault file does not exist for id: {}", id))
        })?;
        file.name = name;
        file.description = description;
        file.classification = classification;
        file.filename = filename;
        file.content_type = content_type;
        file.object_key = object_key;
        file.upload_status = UploadStatus::PendingUpload;
        file.updated_at = Utc::now();
        Ok(file.clone())
    }

    async fn delete_file(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        Ok(self.files.lock().unwrap().remove(&(tenant_id, id)).is_some())
    }

    async fn delete_files_by_folder(
        &self,
        tenant_id: Uuid,
        smart_folder_id: Uuid,
    ) -> Result<u64, AppError> {
        let mut files = self.files.lock().unwrap();
        let before = files.len();
        files.retain(|_, f| !(f.tenant_id == tenant_id && f.smart_folder_id == smart_folder_id));
        Ok((before - files.len()) as u64)
    }

    async fn list_pending_uploads(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<VaultFile>, AppError> {
        let mut files: Vec<VaultFile> = self
            .files
            .lock()
            .unwrap()
            .values()
            .filter(|f| {
                f.upload_status == UploadStatus::PendingUpload && f.updated_at < older_than
            })
            .cloned()
            .collect();
        files.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        Ok(files)
    }
}

/// Mock share link repository for testing without a database
///
/// Shares the folder map with a [`MockSmartFolderRepository`] so the folder
/// re-check inside `create_link` observes archives performed through the
/// folder mock, mirroring the transactional lookup of the real repository.
/// Instrumented with call and concurrency counters for serialization tests.
#[derive(Clone)]
pub struct MockShareLinkRepository {
    links: Arc<Mutex<HashMap<(Uuid, Uuid), ShareLink>>>,
    folders: Arc<Mutex<HashMap<(Uuid, Uuid), SmartFolder>>>,
    create_calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    create_delay: Option<Duration>,
}

impl MockShareLinkRepository {
    pub fn new(folders: &MockSmartFolderRepository) -> Self {
        Self {
            links: Arc::new(Mutex::new(HashMap::new())),
            folders: Arc::clone(&folders.folders),
            create_calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            create_delay: None,
        }
    }

    /// Hold each `create_link` call open for `delay`, so overlapping callers
    /// are observable through [`max_concurrent_creates`](Self::max_concurrent_creates).
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub fn add_link(&self, link: ShareLink) {
        self.links
            .lock()
            .unwrap()
            .insert((link.tenant_id, link.id), link);
    }

    /// How many `create_link` calls reached this repository.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// The highest number of `create_link` calls ever in flight at once.
    pub fn max_concurrent_creates(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn persist(
        &self,
        tenant_id: Uuid,
        tenant_name: String,
        user_id: Uuid,
        user_name: String,
        request: CreateLinkRequest,
    ) -> Result<ShareLink, AppError> {
        let folder = self
            .folders
            .lock()
            .unwrap()
            .get(&(tenant_id, request.smart_folder_id))
            .filter(|f| f.status == RecordStatus::Active)
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "smart folder does not exist for id: {}",
                    request.smart_folder_id
                ))
            })?;

        let now = Utc::now();
        let link = ShareLink {
            id: Uuid::new_v4(),
            tenant_id,
            tenant_name,
            smart_folder_id: folder.id,
            smart_folder_name: folder.name,
            smart_folder_category: folder.category,
            smart_folder_sub_category: folder.sub_category,
            smart_folder_description: folder.description,
            expires_in: request.expires_in,
            expiry_date: ShareLink::expiry_for(now, request.expires_in),
            status: RecordStatus::Active,
            created_at: now,
            created_by_user_id: user_id,
            created_by_user_name: user_name,
        };
        self.add_link(link.clone());
        Ok(link)
    }
}

#[async_trait]
impl ShareLinkRepositoryTrait for MockShareLinkRepository {
    async fn create_link(
        &self,
        tenant_id: Uuid,
        tenant_name: String,
        user_id: Uuid,
        user_name: String,
        request: CreateLinkRequest,
    ) -> Result<ShareLink, AppError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let concurrent = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(concurrent, Ordering::SeqCst);

        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }

        let result = self.persist(tenant_id, tenant_name, user_id, user_name, request);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn get_link(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ShareLink>, AppError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .get(&(tenant_id, id))
            .filter(|l| l.status == RecordStatus::Active)
            .cloned())
    }

    async fn get_link_by_id(&self, id: Uuid) -> Result<Option<ShareLink>, AppError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .values()
            .find(|l| l.id == id && l.status == RecordStatus::Active)
            .cloned())
    }

    async fn list_links_by_folder(
        &self,
        tenant_id: Uuid,
        smart_folder_id: Uuid,
    ) -> Result<Vec<ShareLink>, AppError> {
        let mut links: Vec<ShareLink> = self
            .links
            .lock()
            .unwrap()
            .values()
            .filter(|l| {
                l.tenant_id == tenant_id
                    && l.smart_folder_id == smart_folder_id
                    && l.status == RecordStatus::Active
            })
            .cloned()
            .collect();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(links)
    }

    async fn delete_link(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        Ok(self.links.lock().unwrap().remove(&(tenant_id, id)).is_some())
    }
}
