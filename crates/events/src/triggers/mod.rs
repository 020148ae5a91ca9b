//! Change-to-notification routing.
//!
//! Every captured [`DocumentChange`] is matched against the trigger table by
//! collection and change kind. Each matching handler works out the delta,
//! resolves recipients, builds the Czech copy and fans the messages out
//! through the [`PushGateway`]. Handlers are independent: one change is one
//! unit of work, and its failure is logged here and goes no further.

pub mod beacons;
pub mod chat;
pub mod events;
pub mod marketplace;
pub mod users;

use std::ops::AddAssign;
use std::sync::Arc;

use futures::future::join_all;
use garage_core::models::Document;
use garage_core::paths::{CARS, CHATS, COMMENTS, EVENTS, HELP_BEACONS, MARKETPLACE, MESSAGES, USERS};
use garage_core::quiet_hours::QuietHours;
use garage_db::{ChangeOutbox, DocumentStore, StoreError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::bus::{ChangeKind, DocumentChange};
use crate::delivery::{PushGateway, PushMessage};
use crate::recipients::{Recipient, RecipientResolver, ResolvedUser};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for a failed handler run.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A change snapshot does not have the shape of its collection's model.
    #[error("Failed to decode snapshot of {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The change lacks the snapshot its kind implies.
    #[error("Change of {path} has no {side} snapshot")]
    MissingSnapshot { path: String, side: &'static str },
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

impl DocumentChange {
    /// The document as it was before the change.
    pub fn decode_before<T: Document>(&self) -> Result<T, TriggerError> {
        self.decode_snapshot(self.before.as_ref(), "before")
    }

    /// The document as it is after the change.
    pub fn decode_after<T: Document>(&self) -> Result<T, TriggerError> {
        self.decode_snapshot(self.after.as_ref(), "after")
    }

    fn decode_snapshot<T: Document>(
        &self,
        snapshot: Option<&serde_json::Value>,
        side: &'static str,
    ) -> Result<T, TriggerError> {
        let data = snapshot.ok_or_else(|| TriggerError::MissingSnapshot {
            path: self.path.to_string(),
            side,
        })?;
        garage_core::models::decode(self.path.id(), data.clone()).map_err(|source| {
            TriggerError::Decode {
                path: self.path.to_string(),
                source,
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// Outcome counts of one handler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Messages handed to the gateway.
    pub attempted: usize,
    /// Messages the push service confirmed.
    pub delivered: usize,
}

impl AddAssign for Delivery {
    fn add_assign(&mut self, rhs: Self) {
        self.attempted += rhs.attempted;
        self.delivered += rhs.delivered;
    }
}

/// A message bound for one recipient, with the quiet hours to honour.
#[derive(Debug, Clone)]
pub struct Outgoing {
    pub message: PushMessage,
    pub quiet_hours: QuietHours,
}

impl Outgoing {
    /// Address a message to `recipient`.
    pub fn to(
        recipient: &Recipient,
        channel: &str,
        kind: &str,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            message: PushMessage::new(recipient.token.clone(), channel, kind, title, body),
            quiet_hours: recipient.quiet_hours,
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<String>) -> Self {
        self.message = self.message.with_data(key, value);
        self
    }
}

// ---------------------------------------------------------------------------
// TriggerContext
// ---------------------------------------------------------------------------

/// Everything a handler needs: lookups, recipients and delivery.
#[derive(Clone)]
pub struct TriggerContext {
    pub store: Arc<dyn DocumentStore>,
    pub resolver: RecipientResolver,
    pub gateway: PushGateway,
}

impl TriggerContext {
    pub fn new(store: Arc<dyn DocumentStore>, resolver: RecipientResolver, gateway: PushGateway) -> Self {
        Self {
            store,
            resolver,
            gateway,
        }
    }

    /// Point-resolve one user out of several a handler notifies.
    ///
    /// A failed lookup (store down, malformed profile) is logged and yields
    /// `None`, so it costs only this recipient.
    pub async fn lookup(&self, uid: &str) -> Option<ResolvedUser> {
        match self.resolver.single(uid).await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(uid, error = %e, "Recipient lookup failed, skipping");
                None
            }
        }
    }

    /// Send every message concurrently and wait for all of them.
    ///
    /// One failed send does not affect the others. Logs a single summary
    /// line per handler run.
    pub async fn fan_out(&self, handler: &'static str, outgoing: Vec<Outgoing>) -> Delivery {
        let attempted = outgoing.len();
        if attempted == 0 {
            tracing::debug!(handler, "No recipients");
            return Delivery::default();
        }

        let results = join_all(
            outgoing
                .iter()
                .map(|o| self.gateway.send(&o.message, Some(&o.quiet_hours))),
        )
        .await;
        let delivered = results.into_iter().filter(|sent| *sent).count();

        tracing::info!(handler, attempted, delivered, "Notifications sent");
        Delivery {
            attempted,
            delivered,
        }
    }
}

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// A document mutation pattern that has handlers attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// `helpBeacons/{id}` created.
    BeaconCreated,
    /// `helpBeacons/{id}` updated.
    BeaconUpdated,
    /// `events/{id}/comments/{id}` created.
    CommentCreated,
    /// `events/{id}` created.
    EventCreated,
    /// `events/{id}` updated.
    EventUpdated,
    /// `users/{id}` updated.
    UserUpdated,
    /// `chats/{id}/messages/{id}` created.
    ChatMessageCreated,
    /// `marketplace/{id}` created.
    ListingCreated,
    /// `cars/{id}` updated.
    CarUpdated,
}

impl Trigger {
    /// Match a change against the trigger table.
    pub fn route(change: &DocumentChange) -> Option<Self> {
        let segments = change.path.segments();
        let collections: Vec<&str> = segments.iter().step_by(2).map(String::as_str).collect();

        let trigger = match (collections.as_slice(), change.kind) {
            ([HELP_BEACONS], ChangeKind::Created) => Self::BeaconCreated,
            ([HELP_BEACONS], ChangeKind::Updated) => Self::BeaconUpdated,
            ([EVENTS, COMMENTS], ChangeKind::Created) => Self::CommentCreated,
            ([EVENTS], ChangeKind::Created) => Self::EventCreated,
            ([EVENTS], ChangeKind::Updated) => Self::EventUpdated,
            ([USERS], ChangeKind::Updated) => Self::UserUpdated,
            ([CHATS, MESSAGES], ChangeKind::Created) => Self::ChatMessageCreated,
            ([MARKETPLACE], ChangeKind::Created) => Self::ListingCreated,
            ([CARS], ChangeKind::Updated) => Self::CarUpdated,
            _ => return None,
        };
        Some(trigger)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::BeaconCreated => "beacon_created",
            Self::BeaconUpdated => "beacon_updated",
            Self::CommentCreated => "comment_created",
            Self::EventCreated => "event_created",
            Self::EventUpdated => "event_updated",
            Self::UserUpdated => "user_updated",
            Self::ChatMessageCreated => "chat_message_created",
            Self::ListingCreated => "listing_created",
            Self::CarUpdated => "car_updated",
        }
    }
}

/// Run every handler bound to `trigger`.
///
/// Document updates can carry more than one delta (an event update may
/// change participants and details at once), so some triggers run two
/// independent handlers. Each of them runs whatever the other's outcome;
/// a failure is logged and the successful deliveries are summed.
pub async fn handle(
    ctx: &TriggerContext,
    trigger: Trigger,
    change: &DocumentChange,
) -> Result<Delivery, TriggerError> {
    let delivery = match trigger {
        Trigger::BeaconCreated => beacons::on_beacon_created(ctx, change).await?,
        Trigger::BeaconUpdated => beacons::on_beacon_status_changed(ctx, change).await?,
        Trigger::CommentCreated => events::on_comment_created(ctx, change).await?,
        Trigger::EventCreated => events::on_event_created(ctx, change).await?,
        Trigger::EventUpdated => settle(
            change,
            [
                ("event_participation", events::on_participation_changed(ctx, change).await),
                ("event_update", events::on_event_details_changed(ctx, change).await),
            ],
        ),
        Trigger::UserUpdated => settle(
            change,
            [
                ("friend_request", users::on_friends_added(ctx, change).await),
                ("badge_awarded", users::on_badges_awarded(ctx, change).await),
            ],
        ),
        Trigger::ChatMessageCreated => chat::on_message_created(ctx, change).await?,
        Trigger::ListingCreated => marketplace::on_listing_created(ctx, change).await?,
        Trigger::CarUpdated => marketplace::on_car_for_sale(ctx, change).await?,
    };
    Ok(delivery)
}

/// Sum the outcomes of handlers sharing one change, logging each failure.
fn settle<const N: usize>(
    change: &DocumentChange,
    runs: [(&'static str, Result<Delivery, TriggerError>); N],
) -> Delivery {
    let mut total = Delivery::default();
    for (handler, result) in runs {
        match result {
            Ok(delivery) => total += delivery,
            Err(e) => tracing::error!(
                error = %e,
                handler,
                path = %change.path,
                "Trigger handler failed"
            ),
        }
    }
    total
}

// ---------------------------------------------------------------------------
// TriggerDispatcher
// ---------------------------------------------------------------------------

/// Consumes the change bus and runs handlers, one task per change.
///
/// With an outbox attached, a change read from it is completed once its
/// handlers have run, whatever their outcome. Changes still queued when the
/// dispatcher stops are left in the outbox for the next start.
pub struct TriggerDispatcher {
    ctx: Arc<TriggerContext>,
    outbox: Option<Arc<dyn ChangeOutbox>>,
    tracker: TaskTracker,
}

impl TriggerDispatcher {
    pub fn new(ctx: TriggerContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            outbox: None,
            tracker: TaskTracker::new(),
        }
    }

    /// Complete handled changes in `outbox`.
    pub fn with_outbox(mut self, outbox: Arc<dyn ChangeOutbox>) -> Self {
        self.outbox = Some(outbox);
        self
    }

    /// Run the dispatch loop.
    ///
    /// Exits when `cancel` fires or every publisher is gone, then waits for
    /// the handlers already running to finish.
    pub async fn run(self, mut receiver: mpsc::Receiver<DocumentChange>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Trigger dispatcher cancelled");
                    break;
                }
                received = receiver.recv() => match received {
                    Some(change) => self.dispatch(change),
                    None => {
                        tracing::info!("Change bus closed, trigger dispatcher shutting down");
                        break;
                    }
                },
            }
        }

        // Publishers blocked on a full queue see the bus closed.
        drop(receiver);
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Spawn the handlers for one change, if any match.
    pub fn dispatch(&self, change: DocumentChange) {
        let trigger = Trigger::route(&change);
        if trigger.is_none() && change.outbox_id.is_none() {
            tracing::trace!(path = %change.path, kind = ?change.kind, "No trigger for change");
            return;
        }

        let ctx = Arc::clone(&self.ctx);
        let outbox = self.outbox.clone();
        self.tracker.spawn(async move {
            if let Some(trigger) = trigger {
                if let Err(e) = handle(&ctx, trigger, &change).await {
                    tracing::error!(
                        error = %e,
                        handler = trigger.name(),
                        path = %change.path,
                        "Trigger handler failed"
                    );
                }
            }
            if let (Some(outbox), Some(id)) = (outbox, change.outbox_id) {
                if let Err(e) = outbox.complete(id).await {
                    tracing::error!(change_id = id, error = %e, "Failed to complete change");
                }
            }
        });
    }

    /// Wait for every handler spawned so far.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use garage_core::models::Event;
    use garage_core::paths::DocumentPath;
    use serde_json::json;

    use super::*;

    fn route(path: &str, kind: ChangeKind) -> Option<Trigger> {
        let path = DocumentPath::parse(path).unwrap();
        let change = match kind {
            ChangeKind::Created => DocumentChange::created(path, json!({})),
            ChangeKind::Updated => DocumentChange::updated(path, json!({}), json!({})),
            ChangeKind::Deleted => DocumentChange::deleted(path, json!({})),
        };
        Trigger::route(&change)
    }

    #[test]
    fn routes_by_collection_and_kind() {
        assert_eq!(route("helpBeacons/b1", ChangeKind::Created), Some(Trigger::BeaconCreated));
        assert_eq!(route("helpBeacons/b1", ChangeKind::Updated), Some(Trigger::BeaconUpdated));
        assert_eq!(route("events/e1/comments/c1", ChangeKind::Created), Some(Trigger::CommentCreated));
        assert_eq!(route("events/e1", ChangeKind::Created), Some(Trigger::EventCreated));
        assert_eq!(route("events/e1", ChangeKind::Updated), Some(Trigger::EventUpdated));
        assert_eq!(route("users/u1", ChangeKind::Updated), Some(Trigger::UserUpdated));
        assert_eq!(route("chats/c1/messages/m1", ChangeKind::Created), Some(Trigger::ChatMessageCreated));
        assert_eq!(route("marketplace/l1", ChangeKind::Created), Some(Trigger::ListingCreated));
        assert_eq!(route("cars/c1", ChangeKind::Updated), Some(Trigger::CarUpdated));
    }

    #[test]
    fn unbound_patterns_are_ignored() {
        assert_eq!(route("users/u1", ChangeKind::Created), None);
        assert_eq!(route("events/e1", ChangeKind::Deleted), None);
        assert_eq!(route("events/e1/comments/c1", ChangeKind::Updated), None);
        assert_eq!(route("cars/c1", ChangeKind::Created), None);
        assert_eq!(route("tracker/t1", ChangeKind::Created), None);
    }

    #[test]
    fn missing_snapshot_is_reported() {
        let change = DocumentChange::created(DocumentPath::top_level(EVENTS, "e1"), json!({}));
        assert_matches!(
            change.decode_before::<Event>(),
            Err(TriggerError::MissingSnapshot { side: "before", .. })
        );
        assert_eq!(change.decode_after::<Event>().unwrap().id, "e1");
    }

    #[test]
    fn malformed_snapshot_is_a_decode_error() {
        let change = DocumentChange::created(
            DocumentPath::top_level(EVENTS, "e1"),
            json!({ "participants": "everyone" }),
        );
        assert_matches!(change.decode_after::<Event>(), Err(TriggerError::Decode { .. }));
    }

    #[test]
    fn deliveries_add_up() {
        let mut total = Delivery {
            attempted: 2,
            delivered: 1,
        };
        total += Delivery {
            attempted: 3,
            delivered: 3,
        };
        assert_eq!(
            total,
            Delivery {
                attempted: 5,
                delivered: 4
            }
        );
    }
}
