//! Anonymous share link resolution.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use docvault_core::{
    models::{PublicFileView, PublicLinkView, UploadStatus},
    AppError,
};
use docvault_db::{ShareLinkRepositoryTrait, VaultFileRepositoryTrait};
use docvault_storage::ObjectStore;
use uuid::Uuid;

/// Lifetime of the per-file URLs minted during resolution. Far shorter than
/// any link lifetime; the link gates access, the URL only covers the fetch.
pub const PUBLIC_URL_TTL: Duration = Duration::from_secs(5 * 60);

/// Resolves a share link for an anonymous caller into the folder snapshot
/// plus freshly signed URLs. Holds no state between calls; nothing produced
/// here is ever cached.
#[derive(Clone)]
pub struct PublicLinkResolver {
    links: Arc<dyn ShareLinkRepositoryTrait>,
    files: Arc<dyn VaultFileRepositoryTrait>,
    storage: Arc<dyn ObjectStore>,
}

impl PublicLinkResolver {
    pub fn new(
        links: Arc<dyn ShareLinkRepositoryTrait>,
        files: Arc<dyn VaultFileRepositoryTrait>,
        storage: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            links,
            files,
            storage,
        }
    }

    /// Resolve a link by its public identifier.
    ///
    /// The expiry gate runs before any folder content is read: an expired
    /// link reveals nothing but its expiry instant. Only files whose upload
    /// was confirmed appear, each with a newly signed five-minute URL.
    pub async fn resolve(&self, link_id: Uuid) -> Result<PublicLinkView, AppError> {
        let link = self.links.get_link_by_id(link_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("shareable link does not exist for id: {}", link_id))
        })?;

        if link.is_expired(Utc::now()) {
            tracing::warn!(
                link_id = %link_id,
                expiry_date = %link.expiry_date,
                "share link expired"
            );
            return Err(AppError::Expired {
                at: link.expiry_date,
            });
        }

        let records = self
            .files
            .list_files_by_folder(link.tenant_id, link.smart_folder_id)
            .await?;

        let mut files = Vec::with_capacity(records.len());
        for file in records {
            // Rows whose bytes were never confirmed durable stay invisible.
            if file.upload_status != UploadStatus::Stored {
                continue;
            }
            let url = self
                .storage
                .presigned_url(&file.object_key, PUBLIC_URL_TTL)
                .await?;
            files.push(PublicFileView {
                id: file.id,
                name: file.name,
                filename: file.filename,
                content_type: file.content_type,
                classification: file.classification,
                url,
            });
        }

        tracing::debug!(
            link_id = %link_id,
            file_count = files.len(),
            "share link resolved"
        );

        Ok(PublicLinkView {
            id: link.id,
            smart_folder_name: link.smart_folder_name,
            smart_folder_category: link.smart_folder_category,
            smart_folder_sub_category: link.smart_folder_sub_category,
            smart_folder_description: link.smart_folder_description,
            expiry_date: link.expiry_date,
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        file_fixture, folder_fixture, link_fixture, MockShareLinkRepository,
        MockSmartFolderRepository, MockVaultFileRepository,
    };
    use chrono::Duration as ChronoDuration;
    use chrono::Utc;
    use docvault_storage::MemoryObjectStore;

    struct Setup {
        resolver: PublicLinkResolver,
        links: MockShareLinkRepository,
        files: MockVaultFileRepository,
        storage: Arc<MemoryObjectStore>,
        tenant_id: Uuid,
        folder_id: Uuid,
    }

    fn setup() -> Setup {
        let tenant_id = Uuid::new_v4();
        let folders = MockSmartFolderRepository::new();
        let folder = folder_fixture(tenant_id, 2, 3);
        let folder_id = folder.id;
        folders.add_folder(folder);

        let links = MockShareLinkRepository::new(&folders);
        let files = MockVaultFileRepository::new();
        let storage = Arc::new(MemoryObjectStore::new("vault-test"));

        let resolver = PublicLinkResolver::new(
            Arc::new(links.clone()),
            Arc::new(files.clone()),
            storage.clone(),
        );
        Setup {
            resolver,
            links,
            files,
            storage,
            tenant_id,
            folder_id,
        }
    }

    #[tokio::test]
    async fn missing_link_is_not_found() {
        let s = setup();
        let unknown = Uuid::new_v4();
        let err = s.resolver.resolve(unknown).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(err.to_string().contains(&unknown.to_string()));
    }

    #[tokio::test]
    async fn expired_link_refuses_resolution_with_its_instant() {
        let s = setup();
        let expiry = Utc::now() - ChronoDuration::hours(1);
        let link = link_fixture(s.tenant_id, s.folder_id, expiry);
        s.links.add_link(link.clone());

        let err = s.resolver.resolve(link.id).await.unwrap_err();
        match err {
            AppError::Expired { at } => assert_eq!(at, expiry),
            other => panic!("expected Expired, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resolution_lists_only_stored_files() {
        let s = setup();
        let link = link_fixture(s.tenant_id, s.folder_id, Utc::now() + ChronoDuration::hours(24));
        s.links.add_link(link.clone());

        let stored = file_fixture(s.tenant_id, s.folder_id, "a.pdf", UploadStatus::Stored);
        let pending = file_fixture(s.tenant_id, s.folder_id, "b.pdf", UploadStatus::PendingUpload);
        let failed = file_fixture(s.tenant_id, s.folder_id, "c.pdf", UploadStatus::UploadFailed);
        s.storage
            .upload(&stored.object_key, "application/pdf", bytes::Bytes::from_static(b"pdf"))
            .await
            .unwrap();
        s.files.add_file(stored.clone());
        s.files.add_file(pending);
        s.files.add_file(failed);

        let view = s.resolver.resolve(link.id).await.unwrap();
        assert_eq!(view.files.len(), 1);
        assert_eq!(view.files[0].id, stored.id);
        assert_eq!(view.smart_folder_name, link.smart_folder_name);
        assert_eq!(view.expiry_date, link.expiry_date);
    }

    #[tokio::test]
    async fn every_resolution_signs_fresh_urls() {
        let s = setup();
        let link = link_fixture(s.tenant_id, s.folder_id, Utc::now() + ChronoDuration::hours(24));
        s.links.add_link(link.clone());

        let stored = file_fixture(s.tenant_id, s.folder_id, "a.pdf", UploadStatus::Stored);
        s.storage
            .upload(&stored.object_key, "application/pdf", bytes::Bytes::from_static(b"pdf"))
            .await
            .unwrap();
        s.files.add_file(stored);

        let first = s.resolver.resolve(link.id).await.unwrap();
        let second = s.resolver.resolve(link.id).await.unwrap();
        assert!(!first.files[0].url.is_empty());
        assert_ne!(first.files[0].url, second.files[0].url);
    }
}
