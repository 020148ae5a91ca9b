//! Garage push notification engine.
//!
//! This crate turns document changes into push notifications:
//!
//! - [`ChangeBus`]: bounded in-process queue of captured document changes,
//!   backed by `tokio::sync::mpsc`.
//! - [`ChangeListener`]: bridges PostgreSQL change notifications onto the bus.
//! - [`delivery`]: the push gateway and the FCM backend.
//! - [`RecipientResolver`]: who may be notified, and with which token.
//! - [`triggers`]: per-collection handlers and the [`TriggerDispatcher`].
//! - [`ReminderSweep`]: the daily vehicle reminder job.

pub mod bus;
pub mod delivery;
pub mod listener;
pub mod recipients;
pub mod sweep;
pub mod triggers;

pub use bus::{ChangeBus, ChangeKind, DocumentChange};
pub use delivery::fcm::{FcmBackend, FcmConfig};
pub use delivery::{PushBackend, PushError, PushGateway, PushMessage};
pub use listener::ChangeListener;
pub use recipients::{Recipient, RecipientResolver, ResolvedUser};
pub use sweep::{ReminderSweep, SweepReport};
pub use triggers::{Delivery, TriggerContext, TriggerDispatcher, TriggerError};
