//! In-process [`DocumentStore`] holding JSON documents in a map.
//!
//! Applies the same query semantics as the PostgreSQL store. Useful for
//! exercising handlers without a database, and for replaying captured
//! documents locally.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use garage_core::models::{Car, ChatRoom, Document, Event, UserProfile};
use garage_core::paths::{DocumentPath, CARS, CHATS, EVENTS, USERS};

use crate::error::StoreError;
use crate::store::{decode_many, decode_one, DocumentStore};

/// Map-backed document store.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<String, serde_json::Value>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the document at `path`.
    pub fn put(&self, path: &DocumentPath, data: serde_json::Value) {
        self.documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path.to_string(), data);
    }

    /// Remove the document at `path`, returning its body.
    pub fn remove(&self, path: &DocumentPath) -> Option<serde_json::Value> {
        self.documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&path.to_string())
    }

    /// Make every subsequent query fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn get_document<T: Document>(&self, path: &DocumentPath) -> Result<Option<T>, StoreError> {
        self.check_available()?;
        let data = self
            .documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&path.to_string())
            .cloned();
        data.map(|data| decode_one(&path.to_string(), path.id(), data))
            .transpose()
    }

    /// Documents of a top-level collection matching `filter`, ordered by id.
    fn query<T, F>(&self, collection: &str, filter: F) -> Result<Vec<T>, StoreError>
    where
        T: Document,
        F: Fn(&serde_json::Value) -> bool,
    {
        self.check_available()?;
        let rows: Vec<(String, serde_json::Value)> = self
            .documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter_map(|(path, data)| {
                let path = DocumentPath::parse(path).ok()?;
                (path.collection_path() == collection && filter(data))
                    .then(|| (path.id().to_string(), data.clone()))
            })
            .collect();
        Ok(decode_many(collection, rows))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_user(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        self.get_document(&DocumentPath::top_level(USERS, uid))
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, StoreError> {
        self.query(USERS, |_| true)
    }

    async fn list_users_subscribed_to_new_events(&self) -> Result<Vec<UserProfile>, StoreError> {
        self.query(USERS, |data| {
            data.pointer("/notificationSettings/newEvents/enabled")
                == Some(&serde_json::Value::Bool(true))
        })
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, StoreError> {
        self.get_document(&DocumentPath::top_level(EVENTS, event_id))
    }

    async fn get_chat_room(&self, chat_id: &str) -> Result<Option<ChatRoom>, StoreError> {
        self.get_document(&DocumentPath::top_level(CHATS, chat_id))
    }

    async fn list_cars_by_owner(&self, owner_id: &str) -> Result<Vec<Car>, StoreError> {
        self.query(CARS, |data| {
            data.get("ownerId").and_then(|v| v.as_str()) == Some(owner_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn user_path(uid: &str) -> DocumentPath {
        DocumentPath::top_level(USERS, uid)
    }

    #[tokio::test]
    async fn missing_document_is_none() {
        let store = MemoryStore::new();
        assert!(store.get_user("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_user_attaches_uid_from_path() {
        let store = MemoryStore::new();
        store.put(&user_path("u1"), json!({ "displayName": "Petr" }));
        let user = store.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.uid, "u1");
        assert_eq!(user.display_name, "Petr");
    }

    #[tokio::test]
    async fn list_users_ignores_other_collections_and_nested_documents() {
        let store = MemoryStore::new();
        store.put(&user_path("u1"), json!({}));
        store.put(&user_path("u2"), json!({}));
        store.put(&DocumentPath::top_level(EVENTS, "e1"), json!({}));
        store.put(
            &user_path("u1").child("cars", "c1"),
            json!({ "ownerId": "u1" }),
        );
        let uids: Vec<String> = store
            .list_users()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.uid)
            .collect();
        assert_eq!(uids, vec!["u1", "u2"]);
    }

    #[tokio::test]
    async fn new_event_subscription_filter() {
        let store = MemoryStore::new();
        store.put(
            &user_path("on"),
            json!({ "notificationSettings": { "newEvents": { "enabled": true } } }),
        );
        store.put(
            &user_path("off"),
            json!({ "notificationSettings": { "newEvents": { "enabled": false } } }),
        );
        store.put(&user_path("unset"), json!({}));
        let users = store.list_users_subscribed_to_new_events().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].uid, "on");
    }

    #[tokio::test]
    async fn cars_are_filtered_by_owner() {
        let store = MemoryStore::new();
        store.put(&DocumentPath::top_level(CARS, "c1"), json!({ "ownerId": "u1", "name": "A" }));
        store.put(&DocumentPath::top_level(CARS, "c2"), json!({ "ownerId": "u2", "name": "B" }));
        let cars = store.list_cars_by_owner("u1").await.unwrap();
        assert_eq!(cars.len(), 1);
        assert_eq!(cars[0].id, "c1");
    }

    #[tokio::test]
    async fn malformed_documents_are_skipped_in_lists_but_fail_point_reads() {
        let store = MemoryStore::new();
        store.put(&user_path("good"), json!({}));
        store.put(&user_path("bad"), json!({ "friends": "not-a-list" }));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
        assert_matches!(store.get_user("bad").await, Err(StoreError::Decode { .. }));
    }

    #[tokio::test]
    async fn unavailable_store_fails_queries() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert_matches!(store.list_users().await, Err(StoreError::Database(_)));
        store.set_unavailable(false);
        assert!(store.list_users().await.is_ok());
    }

    #[tokio::test]
    async fn removed_document_disappears() {
        let store = MemoryStore::new();
        store.put(&user_path("u1"), json!({}));
        assert!(store.remove(&user_path("u1")).is_some());
        assert!(store.get_user("u1").await.unwrap().is_none());
    }
}
