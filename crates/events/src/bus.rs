//! In-process change queue backed by a bounded `tokio::sync::mpsc` channel.
//!
//! [`ChangeBus`] carries captured [`DocumentChange`]s from the listener to
//! the trigger dispatcher. When the dispatcher falls behind, publishing
//! waits for room instead of dropping changes. The bus is cheap to clone.

use chrono::Utc;
use garage_core::paths::DocumentPath;
use garage_core::types::Timestamp;
use garage_core::CoreError;
use garage_db::ChangeRow;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// DocumentChange
// ---------------------------------------------------------------------------

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A mutation of one document, with snapshots from before and after it.
///
/// `before` is `None` for creations, `after` is `None` for deletions.
#[derive(Debug, Clone)]
pub struct DocumentChange {
    pub path: DocumentPath,
    pub kind: ChangeKind,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    /// When the change was captured (UTC).
    pub timestamp: Timestamp,
    /// Id of the outbox row this change was read from, completed once the
    /// change has been handled. `None` for changes raised in process.
    pub outbox_id: Option<i64>,
}

impl DocumentChange {
    /// A creation of `path` with body `data`.
    pub fn created(path: DocumentPath, data: serde_json::Value) -> Self {
        Self {
            path,
            kind: ChangeKind::Created,
            before: None,
            after: Some(data),
            timestamp: Utc::now(),
            outbox_id: None,
        }
    }

    /// An update of `path` from `before` to `after`.
    pub fn updated(path: DocumentPath, before: serde_json::Value, after: serde_json::Value) -> Self {
        Self {
            path,
            kind: ChangeKind::Updated,
            before: Some(before),
            after: Some(after),
            timestamp: Utc::now(),
            outbox_id: None,
        }
    }

    /// A deletion of `path` whose last body was `data`.
    pub fn deleted(path: DocumentPath, data: serde_json::Value) -> Self {
        Self {
            path,
            kind: ChangeKind::Deleted,
            before: Some(data),
            after: None,
            timestamp: Utc::now(),
            outbox_id: None,
        }
    }
}

impl TryFrom<ChangeRow> for DocumentChange {
    type Error = CoreError;

    fn try_from(row: ChangeRow) -> Result<Self, Self::Error> {
        let kind = match row.operation.as_str() {
            "created" => ChangeKind::Created,
            "updated" => ChangeKind::Updated,
            "deleted" => ChangeKind::Deleted,
            other => {
                return Err(CoreError::Validation(format!(
                    "unknown change operation '{other}'"
                )))
            }
        };
        Ok(Self {
            path: DocumentPath::parse(&row.path)?,
            kind,
            before: row.before,
            after: row.after,
            timestamp: row.created_at,
            outbox_id: Some(row.id),
        })
    }
}

// ---------------------------------------------------------------------------
// ChangeBus
// ---------------------------------------------------------------------------

/// Default number of changes queued ahead of the dispatcher.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Sending half of the change queue.
///
/// # Usage
///
/// ```rust
/// use garage_core::paths::DocumentPath;
/// use garage_events::bus::{ChangeBus, DocumentChange, DEFAULT_CAPACITY};
///
/// # async fn demo() {
/// let (bus, mut rx) = ChangeBus::channel(DEFAULT_CAPACITY);
///
/// bus.publish(DocumentChange::created(
///     DocumentPath::top_level("marketplace", "l1"),
///     serde_json::json!({ "isActive": true }),
/// ))
/// .await;
/// assert!(rx.recv().await.is_some());
/// # }
/// ```
#[derive(Clone)]
pub struct ChangeBus {
    sender: mpsc::Sender<DocumentChange>,
}

impl ChangeBus {
    /// Create a bus holding up to `capacity` unconsumed changes, and the
    /// receiving end for the dispatcher.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<DocumentChange>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Queue a change for the dispatcher, waiting while the queue is full.
    ///
    /// Returns `false` when the dispatcher has stopped and the change was
    /// not queued.
    pub async fn publish(&self, change: DocumentChange) -> bool {
        self.sender.send(change).await.is_ok()
    }

    /// Whether the receiving end is gone.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn row(operation: &str, path: &str) -> ChangeRow {
        ChangeRow {
            id: 1,
            path: path.to_string(),
            operation: operation.to_string(),
            before: Some(json!({ "status": "active" })),
            after: Some(json!({ "status": "help_coming" })),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_and_receive() {
        let (bus, mut rx) = ChangeBus::channel(DEFAULT_CAPACITY);

        let queued = bus
            .publish(DocumentChange::updated(
                DocumentPath::top_level("helpBeacons", "b1"),
                json!({ "status": "active" }),
                json!({ "status": "help_coming" }),
            ))
            .await;
        assert!(queued);

        let received = rx.recv().await.expect("should receive the change");
        assert_eq!(received.kind, ChangeKind::Updated);
        assert_eq!(received.path.to_string(), "helpBeacons/b1");
        assert_eq!(received.outbox_id, None);
        assert_eq!(received.after.unwrap()["status"], "help_coming");
    }

    /// A burst larger than the queue is delivered in full and in order; the
    /// publisher waits for the consumer instead of overwriting changes.
    #[tokio::test]
    async fn burst_beyond_capacity_loses_nothing() {
        let (bus, mut rx) = ChangeBus::channel(16);

        let producer = tokio::spawn(async move {
            for i in 0..1100 {
                let path = DocumentPath::top_level("cars", &format!("c{i}"));
                assert!(bus.publish(DocumentChange::created(path, json!({}))).await);
            }
        });

        let mut received = Vec::new();
        while let Some(change) = rx.recv().await {
            received.push(change.path.id().to_string());
        }
        producer.await.unwrap();

        assert_eq!(received.len(), 1100);
        assert_eq!(received[0], "c0");
        assert_eq!(received[1099], "c1099");
    }

    #[tokio::test]
    async fn publish_after_receiver_dropped_reports_failure() {
        let (bus, rx) = ChangeBus::channel(4);
        drop(rx);

        assert!(bus.is_closed());
        let queued = bus
            .publish(DocumentChange::deleted(
                DocumentPath::top_level("cars", "c1"),
                json!({}),
            ))
            .await;
        assert!(!queued);
    }

    #[test]
    fn change_row_converts_into_document_change() {
        let change = DocumentChange::try_from(row("updated", "helpBeacons/b1")).unwrap();
        assert_eq!(change.kind, ChangeKind::Updated);
        assert_eq!(change.path.id(), "b1");
        assert_eq!(change.outbox_id, Some(1));
        assert!(change.before.is_some());
    }

    #[test]
    fn change_row_with_unknown_operation_is_rejected() {
        assert_matches!(
            DocumentChange::try_from(row("truncated", "cars/c1")),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn change_row_with_bad_path_is_rejected() {
        assert_matches!(
            DocumentChange::try_from(row("created", "cars")),
            Err(CoreError::InvalidPath(_))
        );
    }
}
