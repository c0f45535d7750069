use chrono::Utc;
use docvault_core::{
    models::{CreateLinkRequest, RecordStatus, ShareLink},
    AppError,
};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::db::transaction::with_transaction;
use crate::db::vault::folder::SmartFolderRepository;

/// Trait for share link repository operations
/// This abstracts the database implementation (PostgreSQL)
#[async_trait::async_trait]
pub trait ShareLinkRepositoryTrait: Send + Sync {
    /// Persist a link atomically: re-fetch the target folder, snapshot its
    /// attributes and insert, all inside one transaction. A missing folder
    /// aborts with a not-found error and no partial row. The request must
    /// already be validated; the caller holds the per-tenant issuance lock.
    async fn create_link(
        &self,
        tenant_id: Uuid,
        tenant_name: String,
        user_id: Uuid,
        user_name: String,
        request: CreateLinkRequest,
    ) -> Result<ShareLink, AppError>;

    async fn get_link(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ShareLink>, AppError>;

    /// Lookup by id alone, for the anonymous resolution path. Public link ids
    /// are unguessable, so no tenant scoping is possible or needed here.
    async fn get_link_by_id(&self, id: Uuid) -> Result<Option<ShareLink>, AppError>;

    async fn list_links_by_folder(
        &self,
        tenant_id: Uuid,
        smart_folder_id: Uuid,
    ) -> Result<Vec<ShareLink>, AppError>;

    /// Revoke a link by deleting it. Returns false when nothing matched.
    async fn delete_link(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}

/// Repository for share links
#[derive(Clone)]
pub struct ShareLinkRepository {
    pool: PgPool,
}

impl ShareLinkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ShareLinkRepositoryTrait for ShareLinkRepository {
    #[tracing::instrument(skip(self, tenant_name, user_name, request), fields(db.table = "share_links", db.operation = "insert"))]
    async fn create_link(
        &self,
        tenant_id: Uuid,
        tenant_name: String,
        user_id: Uuid,
        user_name: String,
        request: CreateLinkRequest,
    ) -> Result<ShareLink, AppError> {
        with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                // Re-check under the issuance lock: the folder must still be
                // active at the instant the snapshot is taken.
                let folder = SmartFolderRepository::get_active_folder_tx(
                    tx,
                    tenant_id,
                    request.smart_folder_id,
                )
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "smart folder does not exist for id: {}",
                        request.smart_folder_id
                    ))
                })?;

                let now = Utc::now();
                let link = sqlx::query_as::<Postgres, ShareLink>(
                    r#"
                    INSERT INTO share_links (
                        id, tenant_id, tenant_name, smart_folder_id,
                        smart_folder_name, smart_folder_category,
                        smart_folder_sub_category, smart_folder_description,
                        expires_in, expiry_date, status, created_at,
                        created_by_user_id, created_by_user_name
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                    RETURNING *
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(tenant_id)
                .bind(&tenant_name)
                .bind(folder.id)
                .bind(&folder.name)
                .bind(folder.category)
                .bind(folder.sub_category)
                .bind(&folder.description)
                .bind(request.expires_in)
                .bind(ShareLink::expiry_for(now, request.expires_in))
                .bind(RecordStatus::Active)
                .bind(now)
                .bind(user_id)
                .bind(&user_name)
                .fetch_one(&mut **tx)
                .await?;

                Ok(link)
            })
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "share_links", db.operation = "select", db.record_id = %id))]
    async fn get_link(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ShareLink>, AppError> {
        let link = sqlx::query_as::<Postgres, ShareLink>(
            "SELECT * FROM share_links WHERE tenant_id = $1 AND id = $2 AND status = 'active'",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    #[tracing::instrument(skip(self), fields(db.table = "share_links", db.operation = "select", db.record_id = %id))]
    async fn get_link_by_id(&self, id: Uuid) -> Result<Option<ShareLink>, AppError> {
        let link = sqlx::query_as::<Postgres, ShareLink>(
            "SELECT * FROM share_links WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    #[tracing::instrument(skip(self), fields(db.table = "share_links", db.operation = "select"))]
    async fn list_links_by_folder(
        &self,
        tenant_id: Uuid,
        smart_folder_id: Uuid,
    ) -> Result<Vec<ShareLink>, AppError> {
        let links = sqlx::query_as::<Postgres, ShareLink>(
            "SELECT * FROM share_links WHERE tenant_id = $1 AND smart_folder_id = $2 AND status = 'active' ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .bind(smart_folder_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(links)
    }

    #[tracing::instrument(skip(self), fields(db.table = "share_links", db.operation = "delete", db.record_id = %id))]
    async fn delete_link(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let rows_affected = sqlx::query("DELETE FROM share_links WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}
