//! Repository for the `document_changes` outbox.
//!
//! A database trigger appends one row per document mutation and announces
//! its id on [`CHANGE_CHANNEL`]. The listener reads rows without removing
//! them; a row is deleted only once the trigger dispatcher has handled its
//! change. Changes in flight when the worker stops are read again on the
//! next start, so every change reaches the handlers at least once.

use async_trait::async_trait;
use garage_core::types::Timestamp;
use sqlx::{FromRow, PgPool};

use crate::error::StoreError;

/// `LISTEN` channel the capture trigger notifies on.
pub const CHANGE_CHANNEL: &str = "document_changes";

/// Column list for `document_changes` queries.
const COLUMNS: &str = "id, path, operation, before, after, created_at";

/// A row from the `document_changes` table.
#[derive(Debug, Clone, FromRow)]
pub struct ChangeRow {
    pub id: i64,
    pub path: String,
    /// `created`, `updated` or `deleted`.
    pub operation: String,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// Provides read and completion operations on the change outbox.
pub struct ChangeRepo;

impl ChangeRepo {
    /// Up to `limit` pending changes with an id above `after_id`, oldest first.
    pub async fn pending_after(
        pool: &PgPool,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<ChangeRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM document_changes \
             WHERE id > $1 \
             ORDER BY id \
             LIMIT $2"
        );
        sqlx::query_as::<_, ChangeRow>(&query)
            .bind(after_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Remove a handled change. Returns `false` when it was already gone.
    pub async fn complete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM document_changes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Where the dispatcher reports a change as handled.
#[async_trait]
pub trait ChangeOutbox: Send + Sync {
    /// Drop the change with outbox id `id`; it will not be replayed.
    async fn complete(&self, id: i64) -> Result<(), StoreError>;
}

/// [`ChangeOutbox`] over the `document_changes` table.
#[derive(Clone)]
pub struct PgChangeOutbox {
    pool: PgPool,
}

impl PgChangeOutbox {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChangeOutbox for PgChangeOutbox {
    async fn complete(&self, id: i64) -> Result<(), StoreError> {
        if !ChangeRepo::complete(&self.pool, id).await? {
            tracing::debug!(change_id = id, "Change already completed");
        }
        Ok(())
    }
}
