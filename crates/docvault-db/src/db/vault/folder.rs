use chrono::Utc;
use docvault_core::{
    models::{CreateSmartFolderRequest, RecordStatus, SmartFolder},
    AppError,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Trait for smart folder repository operations
/// This abstracts the database implementation (PostgreSQL)
#[async_trait::async_trait]
pub trait SmartFolderRepositoryTrait: Send + Sync {
    async fn create_folder(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        user_name: String,
        request: CreateSmartFolderRequest,
    ) -> Result<SmartFolder, AppError>;

    /// Fetch an active folder. Archived folders are invisible here.
    async fn get_folder(&self, tenant_id: Uuid, id: Uuid)
        -> Result<Option<SmartFolder>, AppError>;

    async fn list_folders(&self, tenant_id: Uuid) -> Result<Vec<SmartFolder>, AppError>;

    /// Soft-delete a folder. Returns false when no active folder matched.
    async fn archive_folder(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}

/// Repository for tenant smart folders
#[derive(Clone)]
pub struct SmartFolderRepository {
    pool: PgPool,
}

impl SmartFolderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch an active folder inside an open transaction. Link issuance uses
    /// this to re-check the folder under the tenant lock before persisting.
    pub async fn get_active_folder_tx(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<SmartFolder>, AppError> {
        let folder = sqlx::query_as::<Postgres, SmartFolder>(
            "SELECT * FROM smart_folders WHERE tenant_id = $1 AND id = $2 AND status = 'active'",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(folder)
    }
}

#[async_trait::async_trait]
impl SmartFolderRepositoryTrait for SmartFolderRepository {
    #[tracing::instrument(skip(self, request), fields(db.table = "smart_folders", db.operation = "insert"))]
    async fn create_folder(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        user_name: String,
        request: CreateSmartFolderRequest,
    ) -> Result<SmartFolder, AppError> {
        let now = Utc::now();
        let folder = sqlx::query_as::<Postgres, SmartFolder>(
            r#"
            INSERT INTO smart_folders (
                id, tenant_id, name, description, category, sub_category,
                sort_number, status, created_at, created_by_user_id,
                created_by_user_name, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.category)
        .bind(request.sub_category)
        .bind(request.sort_number)
        .bind(RecordStatus::Active)
        .bind(now)
        .bind(user_id)
        .bind(&user_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(folder)
    }

    #[tracing::instrument(skip(self), fields(db.table = "smart_folders", db.operation = "select", db.record_id = %id))]
    async fn get_folder(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<SmartFolder>, AppError> {
        let folder = sqlx::query_as::<Postgres, SmartFolder>(
            "SELECT * FROM smart_folders WHERE tenant_id = $1 AND id = $2 AND status = 'active'",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(folder)
    }

    #[tracing::instrument(skip(self), fields(db.table = "smart_folders", db.operation = "select"))]
    async fn list_folders(&self, tenant_id: Uuid) -> Result<Vec<SmartFolder>, AppError> {
        let folders = sqlx::query_as::<Postgres, SmartFolder>(
            "SELECT * FROM smart_folders WHERE tenant_id = $1 AND status = 'active' ORDER BY sort_number ASC, name ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(folders)
    }

    #[tracing::instrument(skip(self), fields(db.table = "smart_folders", db.operation = "update", db.record_id = %id))]
    async fn archive_folder(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let rows_affected = sqlx::query(
            "UPDATE smart_folders SET status = 'archived', updated_at = NOW() WHERE tenant_id = $1 AND id = $2 AND status = 'active'",
        )
        .bind(tenant_id)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}
