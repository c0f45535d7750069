//! Database transaction utilities
//!
//! This module provides a helper for multi-step operations that need
//! atomicity, such as the folder re-check plus insert performed during link
//! issuance.

use sqlx::{PgPool, Postgres, Transaction};

/// Execute a closure within a database transaction
///
/// Begins a transaction, executes the closure, commits on success and rolls
/// back on error. The closure's error type is preserved so domain errors
/// (not-found, validation) survive the transaction boundary; begin and commit
/// failures are surfaced through `From<sqlx::Error>`.
///
/// # Example
///
/// ```ignore
/// use docvault_core::AppError;
/// use docvault_db::db::transaction::with_transaction;
///
/// async fn example(pool: &sqlx::PgPool) -> Result<(), AppError> {
///     with_transaction(pool, |tx| {
///         Box::pin(async move {
///             sqlx::query("INSERT INTO ...").execute(&mut **tx).await?;
///             sqlx::query("UPDATE ...").execute(&mut **tx).await?;
///             Ok(())
///         })
///     })
///     .await
/// }
/// ```
pub async fn with_transaction<F, R, E>(pool: &PgPool, f: F) -> Result<R, E>
where
    F: for<'a> FnOnce(
        &'a mut Transaction<'_, Postgres>,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<R, E>> + Send + 'a>,
    >,
    E: From<sqlx::Error> + Send,
{
    let mut tx = pool.begin().await.map_err(E::from)?;

    match f(&mut tx).await {
        Ok(result) => {
            tx.commit().await.map_err(E::from)?;
            Ok(result)
        }
        Err(e) => {
            tx.rollback().await.ok(); // Ignore rollback errors
            Err(e)
        }
    }
}
