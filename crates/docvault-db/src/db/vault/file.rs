use chrono::{DateTime, Utc};
use docvault_core::{
    models::{NewVaultFile, RecordStatus, UploadStatus, VaultFile},
    AppError,
};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Trait for vault file repository operations
/// This abstracts the database implementation (PostgreSQL)
#[async_trait::async_trait]
pub trait VaultFileRepositoryTrait: Send + Sync {
    /// Insert a metadata row in `PendingUpload`. The bucket write happens
    /// after this returns; the caller confirms it via [`set_upload_status`].
    ///
    /// [`set_upload_status`]: VaultFileRepositoryTrait::set_upload_status
    async fn create_file(&self, input: NewVaultFile) -> Result<VaultFile, AppError>;

    async fn get_file(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<VaultFile>, AppError>;

    /// Active rows in a folder, newest first, regardless of upload status.
    /// Callers that hand out URLs must keep only `Stored` rows.
    async fn list_files_by_folder(
        &self,
        tenant_id: Uuid,
        smart_folder_id: Uuid,
    ) -> Result<Vec<VaultFile>, AppError>;

    async fn set_upload_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        upload_status: UploadStatus,
    ) -> Result<(), AppError>;

    /// Metadata-only update; the object key is left untouched.
    async fn update_metadata(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        name: String,
        description: String,
        classification: i64,
    ) -> Result<VaultFile, AppError>;

    /// Rewrite the row for a content replacement: new filename, content type
    /// and object key, upload status back to `PendingUpload` until the write
    /// confirms.
    #[allow(clippy::too_many_arguments)]
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
    ) -> Result<VaultFile, AppError>;

    /// Hard-delete a row. Returns false when nothing matched.
    async fn delete_file(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    /// Hard-delete every row in a folder, returning how many were removed.
    async fn delete_files_by_folder(
        &self,
        tenant_id: Uuid,
        smart_folder_id: Uuid,
    ) -> Result<u64, AppError>;

    /// Rows stuck in `PendingUpload` since before the cutoff, oldest first.
    /// Crosses tenants; this feeds the reconciliation sweep, not user reads.
    async fn list_pending_uploads(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<VaultFile>, AppError>;
}

/// Repository for vault file metadata
#[derive(Clone)]
pub struct VaultFileRepository {
    pool: PgPool,
}

impl VaultFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VaultFileRepositoryTrait for VaultFileRepository {
    #[tracing::instrument(skip(self, input), fields(db.table = "vault_files", db.operation = "insert"))]
    async fn create_file(&self, input: NewVaultFile) -> Result<VaultFile, AppError> {
        let now = Utc::now();
        let file = sqlx::query_as::<Postgres, VaultFile>(
            r#"
            INSERT INTO vault_files (
                id, tenant_id, name, description, filename, object_key,
                content_type, classification, smart_folder_id, smart_folder_name,
                smart_folder_category, smart_folder_sub_category, status,
                upload_status, created_at, created_by_user_id,
                created_by_user_name, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.tenant_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.filename)
        .bind(&input.object_key)
        .bind(&input.content_type)
        .bind(input.classification)
        .bind(input.smart_folder_id)
        .bind(&input.smart_folder_name)
        .bind(input.smart_folder_category)
        .bind(input.smart_folder_sub_category)
        .bind(RecordStatus::Active)
        .bind(UploadStatus::PendingUpload)
        .bind(now)
        .bind(input.created_by_user_id)
        .bind(&input.created_by_user_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(file)
    }

    #[tracing::instrument(skip(self), fields(db.table = "vault_files", db.operation = "select", db.record_id = %id))]
    async fn get_file(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<VaultFile>, AppError> {
        let file = sqlx::query_as::<Postgres, VaultFile>(
            "SELECT * FROM vault_files WHERE tenant_id = $1 AND id = $2 AND status = 'active'",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    #[tracing::instrument(skip(self), fields(db.table = "vault_files", db.operation = "select"))]
    async fn list_files_by_folder(
        &self,
        tenant_id: Uuid,
        smart_folder_id: Uuid,
    ) -> Result<Vec<VaultFile>, AppError> {
        let files = sqlx::query_as::<Postgres, VaultFile>(
            "SELECT * FROM vault_files WHERE tenant_id = $1 AND smart_folder_id = $2 AND status = 'active' ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .bind(smart_folder_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    #[tracing::instrument(skip(self), fields(db.table = "vault_files", db.operation = "update", db.record_id = %id))]
    async fn set_upload_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        upload_status: UploadStatus,
    ) -> Result<(), AppError> {
        let rows_affected = sqlx::query(
            "UPDATE vault_files SET upload_status = $3, updated_at = NOW() WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(upload_status)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            tracing::warn!(
                file_id = %id,
                ?upload_status,
                "upload status update matched no row"
            );
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, name, description), fields(db.table = "vault_files", db.operation = "update", db.record_id = %id))]
    async fn update_metadata(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        name: String,
        description: String,
        classification: i64,
    ) -> Result<VaultFile, AppError> {
        let file = sqlx::query_as::<Postgres, VaultFile>(
            r#"
            UPDATE vault_files
            SET name = $3, description = $4, classification = $5, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND status = 'active'
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(&name)
        .bind(&description)
        .bind(classification)
        .fetch_one(&self.pool)
        .await?;

        Ok(file)
    }

    #[tracing::instrument(skip(self, name, description, filename, content_type, object_key), fields(db.table = "vault_files", db.operation = "update", db.record_id = %id))]
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
        let file = sqlx::query_as::<Postgres, VaultFile>(
            r#"
            UPDATE vault_files
            SET name = $3, description = $4, classification = $5,
                filename = $6, content_type = $7, object_key = $8,
                upload_status = $9, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND status = 'active'
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(&name)
        .bind(&description)
        .bind(classification)
        .bind(&filename)
        .bind(&content_type)
        .bind(&object_key)
        .bind(UploadStatus::PendingUpload)
        .fetch_one(&self.pool)
        .await?;

        Ok(file)
    }

    #[tracing::instrument(skip(self), fields(db.table = "vault_files", db.operation = "delete", db.record_id = %id))]
    async fn delete_file(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let rows_affected = sqlx::query("DELETE FROM vault_files WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "vault_files", db.operation = "delete"))]
    async fn delete_files_by_folder(
        &self,
        tenant_id: Uuid,
        smart_folder_id: Uuid,
    ) -> Result<u64, AppError> {
        let rows_affected =
            sqlx::query("DELETE FROM vault_files WHERE tenant_id = $1 AND smart_folder_id = $2")
                .bind(tenant_id)
                .bind(smart_folder_id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(rows_affected)
    }

    #[tracing::instrument(skip(self), fields(db.table = "vault_files", db.operation = "select"))]
    async fn list_pending_uploads(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<VaultFile>, AppError> {
        let files = sqlx::query_as::<Postgres, VaultFile>(
            "SELECT * FROM vault_files WHERE upload_status = 'pending_upload' AND updated_at < $1 ORDER BY updated_at ASC",
        )
        .bind(older_than)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }
}
