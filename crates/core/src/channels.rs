//! Well-known push channel identifiers.
//!
//! The mobile client registers one Android notification channel per value
//! and uses it to pick importance and sound. The values travel as
//! `channelId` in every push message and must match the client's channel
//! registry exactly.

/// General notifications (friends, badges).
pub const CHANNEL_DEFAULT: &str = "default";

/// SOS beacons. The only channel that ignores quiet hours.
pub const CHANNEL_ALERTS: &str = "alerts";

/// Direct chat messages.
pub const CHANNEL_MESSAGES: &str = "messages";

/// New listings and cars put up for sale.
pub const CHANNEL_MARKETPLACE: &str = "marketplace";

/// Event comments, participation and event changes.
pub const CHANNEL_EVENTS: &str = "events";

/// Daily vehicle reminder sweep.
pub const CHANNEL_REMINDERS: &str = "reminders";

/// Whether notifications on `channel` are delivered even inside quiet hours.
pub fn bypasses_quiet_hours(channel: &str) -> bool {
    channel == CHANNEL_ALERTS
}
