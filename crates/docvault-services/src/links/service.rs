//! Share link issuance and management.

use std::sync::Arc;

use docvault_core::{
    models::{CreateLinkRequest, ShareLink},
    AppError,
};
use docvault_db::ShareLinkRepositoryTrait;
use uuid::Uuid;

use crate::lock::LockRegistry;

/// Issues, lists and revokes share links. Issuance is serialized per tenant
/// through the injected lock registry.
#[derive(Clone)]
pub struct ShareLinkService {
    links: Arc<dyn ShareLinkRepositoryTrait>,
    locks: LockRegistry,
}

impl ShareLinkService {
    pub fn new(links: Arc<dyn ShareLinkRepositoryTrait>, locks: LockRegistry) -> Self {
        Self { links, locks }
    }

    /// Issue a link for a folder.
    ///
    /// Validation runs before the lock is taken, so malformed requests are
    /// rejected without contending with concurrent issuers. The per-tenant
    /// lock then spans the whole persist step (folder re-check, snapshot,
    /// insert) and is released on every exit path when the guard drops.
    pub async fn create_link(
        &self,
        tenant_id: Uuid,
        tenant_name: String,
        user_id: Uuid,
        user_name: String,
        request: CreateLinkRequest,
    ) -> Result<ShareLink, AppError> {
        request.validate()?;

        let lock = self
            .locks
            .lock_for(&format!("create-link-by-tenant-{}", tenant_id));
        let _guard = lock.lock().await;

        let link = self
            .links
            .create_link(tenant_id, tenant_name, user_id, user_name, request)
            .await?;

        tracing::info!(
            link_id = %link.id,
            tenant_id = %tenant_id,
            smart_folder_id = %link.smart_folder_id,
            expiry_date = %link.expiry_date,
            "share link created"
        );
        Ok(link)
    }

    pub async fn get_link(&self, tenant_id: Uuid, id: Uuid) -> Result<ShareLink, AppError> {
        self.links.get_link(tenant_id, id).await?.ok_or_else(|| {
            AppError::NotFound(format!("shareable link does not exist for id: {}", id))
        })
    }

    pub async fn list_links_by_folder(
        &self,
        tenant_id: Uuid,
        smart_folder_id: Uuid,
    ) -> Result<Vec<ShareLink>, AppError> {
        self.links
            .list_links_by_folder(tenant_id, smart_folder_id)
            .await
    }

    /// Revoke a link. Revoking a link that does not exist reports not-found
    /// so callers learn when they raced another revocation.
    pub async fn delete_link(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let deleted = self.links.delete_link(tenant_id, id).await?;
        if !deleted {
            return Err(AppError::NotFound(format!(
                "shareable link does not exist for id: {}",
                id
            )));
        }

        tracing::info!(link_id = %id, tenant_id = %tenant_id, "share link revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{folder_fixture, MockShareLinkRepository, MockSmartFolderRepository};
    use chrono::Duration;
    use docvault_core::models::SmartFolder;

    fn service_with_folder(tenant_id: Uuid) -> (ShareLinkService, MockShareLinkRepository, SmartFolder) {
        let folders = MockSmartFolderRepository::new();
        let folder = folder_fixture(tenant_id, 2, 3);
        folders.add_folder(folder.clone());

        let links = MockShareLinkRepository::new(&folders);
        let service = ShareLinkService::new(Arc::new(links.clone()), LockRegistry::new());
        (service, links, folder)
    }

    #[tokio::test]
    async fn create_link_snapshots_folder_and_computes_expiry() {
        let tenant_id = Uuid::new_v4();
        let (service, _links, folder) = service_with_folder(tenant_id);

        let link = service
            .create_link(
                tenant_id,
                "Acme".to_string(),
                Uuid::new_v4(),
                "bob".to_string(),
                CreateLinkRequest {
                    smart_folder_id: folder.id,
                    expires_in: 24,
                },
            )
            .await
            .unwrap();

        assert_eq!(link.smart_folder_name, folder.name);
        assert_eq!(link.smart_folder_category, folder.category);
        assert_eq!(link.smart_folder_sub_category, folder.sub_category);
        assert_eq!(link.expires_in, 24);
        assert_eq!(link.expiry_date, link.created_at + Duration::hours(24));
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_the_repository() {
        let tenant_id = Uuid::new_v4();
        let (service, links, _folder) = service_with_folder(tenant_id);

        let err = service
            .create_link(
                tenant_id,
                "Acme".to_string(),
                Uuid::new_v4(),
                "bob".to_string(),
                CreateLinkRequest {
                    smart_folder_id: Uuid::nil(),
                    expires_in: 0,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(links.create_calls(), 0);
    }

    #[tokio::test]
    async fn missing_folder_aborts_with_not_found() {
        let tenant_id = Uuid::new_v4();
        let (service, _links, _folder) = service_with_folder(tenant_id);
        let unknown = Uuid::new_v4();

        let err = service
            .create_link(
                tenant_id,
                "Acme".to_string(),
                Uuid::new_v4(),
                "bob".to_string(),
                CreateLinkRequest {
                    smart_folder_id: unknown,
                    expires_in: 24,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(err.to_string().contains(&unknown.to_string()));
    }

    #[tokio::test]
    async fn archived_folder_cannot_be_linked() {
        let tenant_id = Uuid::new_v4();
        let folders = MockSmartFolderRepository::new();
        let folder = folder_fixture(tenant_id, 2, 3);
        folders.add_folder(folder.clone());
        let links = MockShareLinkRepository::new(&folders);
        let service = ShareLinkService::new(Arc::new(links), LockRegistry::new());

        use docvault_db::SmartFolderRepositoryTrait;
        folders.archive_folder(tenant_id, folder.id).await.unwrap();

        let err = service
            .create_link(
                tenant_id,
                "Acme".to_string(),
                Uuid::new_v4(),
                "bob".to_string(),
                CreateLinkRequest {
                    smart_folder_id: folder.id,
                    expires_in: 24,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn revoking_a_missing_link_is_not_found() {
        let tenant_id = Uuid::new_v4();
        let (service, _links, _folder) = service_with_folder(tenant_id);

        let err = service
            .delete_link(tenant_id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn issued_links_are_listed_for_their_folder() {
        let tenant_id = Uuid::new_v4();
        let (service, _links, folder) = service_with_folder(tenant_id);

        let link = service
            .create_link(
                tenant_id,
                "Acme".to_string(),
                Uuid::new_v4(),
                "bob".to_string(),
                CreateLinkRequest {
                    smart_folder_id: folder.id,
                    expires_in: 12,
                },
            )
            .await
            .unwrap();

        let listed = service
            .list_links_by_folder(tenant_id, folder.id)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, link.id);

        let fetched = service.get_link(tenant_id, link.id).await.unwrap();
        assert_eq!(fetched.id, link.id);

        service.delete_link(tenant_id, link.id).await.unwrap();
        let err = service.get_link(tenant_id, link.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
