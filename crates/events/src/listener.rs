//! PostgreSQL change listener.
//!
//! [`ChangeListener`] subscribes to the `document_changes` notification
//! channel and publishes every outbox row it has not seen yet on the
//! [`ChangeBus`]. Rows stay in the outbox until the dispatcher completes
//! them, so on startup the listener replays whatever was pending or in
//! flight when the previous worker stopped. After a reconnect it reads
//! again from where it left off.

use garage_db::{ChangeRepo, ChangeRow, DbPool, CHANGE_CHANNEL};
use sqlx::postgres::PgListener;
use tokio_util::sync::CancellationToken;

use crate::bus::{ChangeBus, DocumentChange};

/// Number of outbox rows read per query.
const BATCH: i64 = 100;

/// Background service bridging database notifications onto the change bus.
pub struct ChangeListener {
    pool: DbPool,
    bus: ChangeBus,
}

/// How far a drain got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drained {
    /// Every pending row was published.
    Caught,
    /// Cancelled or the dispatcher went away before the backlog ended.
    Stopped,
}

impl ChangeListener {
    pub fn new(pool: DbPool, bus: ChangeBus) -> Self {
        Self { pool, bus }
    }

    /// Run the listener loop until `cancel` fires.
    ///
    /// Connection losses are recovered by `PgListener`; notifications sent
    /// while disconnected are picked up by reading the outbox again.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        tracing::info!(channel = CHANGE_CHANNEL, "Listening for document changes");

        // Highest outbox id already published.
        let mut cursor = 0;
        if self.drain(&mut cursor, &cancel).await? == Drained::Stopped {
            return Ok(());
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Change listener cancelled");
                    break;
                }
                received = listener.try_recv() => {
                    match received? {
                        Some(notification) => {
                            if let Ok(id) = notification.payload().parse::<i64>() {
                                if id <= cursor {
                                    continue;
                                }
                            }
                        }
                        None => tracing::warn!("Change listener connection lost, reading outbox after reconnect"),
                    }
                    match self.drain(&mut cursor, &cancel).await {
                        Ok(Drained::Caught) => {}
                        Ok(Drained::Stopped) => break,
                        Err(e) => tracing::error!(error = %e, "Failed to read change outbox"),
                    }
                }
            }
        }

        Ok(())
    }

    /// Publish every outbox row above `cursor`, oldest first, advancing it.
    async fn drain(&self, cursor: &mut i64, cancel: &CancellationToken) -> Result<Drained, sqlx::Error> {
        let mut total = 0usize;
        loop {
            let rows = ChangeRepo::pending_after(&self.pool, *cursor, BATCH).await?;
            if rows.is_empty() {
                break;
            }
            for row in rows {
                let id = row.id;
                if !self.publish(row, cancel).await? {
                    tracing::info!(change_id = id, "Change dispatch stopped, leaving the rest in the outbox");
                    return Ok(Drained::Stopped);
                }
                *cursor = id;
                total += 1;
            }
        }
        if total > 1 {
            tracing::info!(count = total, "Read pending changes from outbox");
        }
        Ok(Drained::Caught)
    }

    /// Hand one row to the dispatcher. Returns `false` when it could not be
    /// queued because the worker is stopping.
    async fn publish(&self, row: ChangeRow, cancel: &CancellationToken) -> Result<bool, sqlx::Error> {
        let id = row.id;
        let change = match DocumentChange::try_from(row) {
            Ok(change) => change,
            Err(e) => {
                // Unreadable rows leave the outbox and are never replayed.
                tracing::warn!(change_id = id, error = %e, "Discarding unreadable change");
                ChangeRepo::complete(&self.pool, id).await?;
                return Ok(true);
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => Ok(false),
            queued = self.bus.publish(change) => {
                if queued {
                    tracing::debug!(change_id = id, "Change published");
                }
                Ok(queued)
            }
        }
    }
}
