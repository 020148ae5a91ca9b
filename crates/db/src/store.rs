//! The query surface the notification engine needs from the document store.

use async_trait::async_trait;
use garage_core::models::{decode, Car, ChatRoom, Document, Event, UserProfile};

use crate::error::StoreError;

/// Read-only access to the documents the engine reacts to.
///
/// Point lookups return `Ok(None)` for a missing document; callers treat
/// that as "cannot notify", not as an error.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_user(&self, uid: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Every user profile. A full scan, fine at community scale.
    async fn list_users(&self) -> Result<Vec<UserProfile>, StoreError>;

    /// Users whose `notificationSettings.newEvents.enabled` is `true`.
    ///
    /// Served by an index; the event-type filter is applied by the caller.
    async fn list_users_subscribed_to_new_events(&self) -> Result<Vec<UserProfile>, StoreError>;

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, StoreError>;

    async fn get_chat_room(&self, chat_id: &str) -> Result<Option<ChatRoom>, StoreError>;

    async fn list_cars_by_owner(&self, owner_id: &str) -> Result<Vec<Car>, StoreError>;
}

/// Decode a single document, surfacing shape errors with their path.
pub(crate) fn decode_one<T: Document>(
    path: &str,
    id: &str,
    data: serde_json::Value,
) -> Result<T, StoreError> {
    decode(id, data).map_err(|source| StoreError::Decode {
        path: path.to_string(),
        source,
    })
}

/// Decode a query result, skipping (and logging) malformed documents so one
/// broken profile does not block everybody else's notifications.
pub(crate) fn decode_many<T: Document>(
    collection: &str,
    rows: impl IntoIterator<Item = (String, serde_json::Value)>,
) -> Vec<T> {
    rows.into_iter()
        .filter_map(|(id, data)| match decode(&id, data) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(collection, doc_id = %id, error = %e, "Skipping malformed document");
                None
            }
        })
        .collect()
}
