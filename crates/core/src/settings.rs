//! Per-user notification settings and the opt-in gate.
//!
//! Every push passes two gates: the global `enabled` switch and the flag of
//! the notification's [`Category`]. A user with `enabled == false` never
//! receives anything, whatever the category flags say.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{null_default, EventType};
use crate::quiet_hours::QuietHours;

/// The `notificationSettings` object embedded in a user profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub sos_alerts: bool,
    pub friend_requests: bool,
    pub event_comments: bool,
    pub event_changes: bool,
    pub event_participation: bool,
    pub app_updates: bool,
    pub vehicle_reminders: bool,
    pub marketplace_notifications: bool,
    pub chat_messages: bool,
    pub badge_notifications: bool,
    /// Stored for the client; the engine does not batch notifications.
    pub digest_mode: bool,
    #[serde(deserialize_with = "null_default")]
    pub new_events: NewEventsSettings,
    #[serde(deserialize_with = "null_default")]
    pub quiet_hours: QuietHours,
}

/// Subscription to newly created events, filtered by event kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewEventsSettings {
    pub enabled: bool,
    #[serde(deserialize_with = "null_default")]
    pub types: Vec<EventType>,
}

/// Opt-in flag a notification is gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    SosAlerts,
    FriendRequests,
    EventComments,
    EventChanges,
    EventParticipation,
    AppUpdates,
    VehicleReminders,
    MarketplaceNotifications,
    ChatMessages,
    BadgeNotifications,
    NewEvents,
}

impl Category {
    /// The settings field name, as stored in the document.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::SosAlerts => "sosAlerts",
            Self::FriendRequests => "friendRequests",
            Self::EventComments => "eventComments",
            Self::EventChanges => "eventChanges",
            Self::EventParticipation => "eventParticipation",
            Self::AppUpdates => "appUpdates",
            Self::VehicleReminders => "vehicleReminders",
            Self::MarketplaceNotifications => "marketplaceNotifications",
            Self::ChatMessages => "chatMessages",
            Self::BadgeNotifications => "badgeNotifications",
            Self::NewEvents => "newEvents",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl NotificationSettings {
    /// The raw category flag, ignoring the global switch.
    pub fn flag(&self, category: Category) -> bool {
        match category {
            Category::SosAlerts => self.sos_alerts,
            Category::FriendRequests => self.friend_requests,
            Category::EventComments => self.event_comments,
            Category::EventChanges => self.event_changes,
            Category::EventParticipation => self.event_participation,
            Category::AppUpdates => self.app_updates,
            Category::VehicleReminders => self.vehicle_reminders,
            Category::MarketplaceNotifications => self.marketplace_notifications,
            Category::ChatMessages => self.chat_messages,
            Category::BadgeNotifications => self.badge_notifications,
            Category::NewEvents => self.new_events.enabled,
        }
    }

    /// Both gates: the global switch and the category flag.
    pub fn allows(&self, category: Category) -> bool {
        self.enabled && self.flag(category)
    }

    /// Whether a newly created event of `event_type` should be announced.
    pub fn wants_new_event(&self, event_type: EventType) -> bool {
        self.allows(Category::NewEvents) && self.new_events.types.contains(&event_type)
    }

    /// Whether quiet hours mute notifications at local `hour`.
    pub fn is_quiet_at(&self, hour: u8) -> bool {
        self.quiet_hours.is_active_at(hour)
    }
}
