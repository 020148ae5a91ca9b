//! PostgreSQL-backed [`DocumentStore`].
//!
//! Documents live in the `documents` table as JSONB bodies keyed by their
//! full path. Queries filter on `collection` plus JSON expressions that are
//! backed by partial indexes (see `db/migrations`).

use async_trait::async_trait;
use garage_core::models::{Car, ChatRoom, Document, Event, UserProfile};
use garage_core::paths::{DocumentPath, CARS, CHATS, EVENTS, USERS};

use crate::error::StoreError;
use crate::store::{decode_many, decode_one, DocumentStore};
use crate::DbPool;

/// Document store over the `documents` table.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: DbPool,
}

impl PgDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Fetch and decode the document at `path`.
    async fn get_document<T: Document>(&self, path: &DocumentPath) -> Result<Option<T>, StoreError> {
        let path = path.to_string();
        let row: Option<(String, serde_json::Value)> =
            sqlx::query_as("SELECT doc_id, data FROM documents WHERE path = $1")
                .bind(&path)
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(id, data)| decode_one(&path, &id, data)).transpose()
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get_user(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        self.get_document(&DocumentPath::top_level(USERS, uid)).await
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, StoreError> {
        let rows: Vec<(String, serde_json::Value)> = sqlx::query_as(
            "SELECT doc_id, data FROM documents \
             WHERE collection = $1 \
             ORDER BY doc_id",
        )
        .bind(USERS)
        .fetch_all(&self.pool)
        .await?;
        Ok(decode_many(USERS, rows))
    }

    async fn list_users_subscribed_to_new_events(&self) -> Result<Vec<UserProfile>, StoreError> {
        let rows: Vec<(String, serde_json::Value)> = sqlx::query_as(
            "SELECT doc_id, data FROM documents \
             WHERE collection = $1 \
               AND (data #> '{notificationSettings,newEvents,enabled}') = 'true'::jsonb \
             ORDER BY doc_id",
        )
        .bind(USERS)
        .fetch_all(&self.pool)
        .await?;
        Ok(decode_many(USERS, rows))
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, StoreError> {
        self.get_document(&DocumentPath::top_level(EVENTS, event_id)).await
    }

    async fn get_chat_room(&self, chat_id: &str) -> Result<Option<ChatRoom>, StoreError> {
        self.get_document(&DocumentPath::top_level(CHATS, chat_id)).await
    }

    async fn list_cars_by_owner(&self, owner_id: &str) -> Result<Vec<Car>, StoreError> {
        let rows: Vec<(String, serde_json::Value)> = sqlx::query_as(
            "SELECT doc_id, data FROM documents \
             WHERE collection = $1 AND data->>'ownerId' = $2 \
             ORDER BY doc_id",
        )
        .bind(CARS)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(decode_many(CARS, rows))
    }
}
