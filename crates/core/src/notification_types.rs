//! Values of the `type` key in the push `data` block.
//!
//! The client routes taps on a notification by this discriminant, so each
//! constant is part of the wire contract.

pub const TYPE_BADGE_AWARDED: &str = "badge_awarded";
pub const TYPE_BEACON_HELP_COMING: &str = "beacon_help_coming";
pub const TYPE_BEACON_RESOLVED: &str = "beacon_resolved";
pub const TYPE_EVENT_COMMENT: &str = "event_comment";
pub const TYPE_EVENT_PARTICIPANT_JOINED: &str = "event_participant_joined";
pub const TYPE_EVENT_PARTICIPANT_LEFT: &str = "event_participant_left";
pub const TYPE_EVENT_UPDATE: &str = "event_update";
pub const TYPE_FRIEND_REQUEST: &str = "friend_request";
pub const TYPE_MARKETPLACE_LISTING: &str = "marketplace_listing";
pub const TYPE_CAR_FOR_SALE: &str = "car_for_sale";
pub const TYPE_CHAT_MESSAGE: &str = "chat_message";
pub const TYPE_NEW_EVENT: &str = "new_event";
pub const TYPE_SOS_BEACON: &str = "sos_beacon";
pub const TYPE_VEHICLE_REMINDER: &str = "vehicle_reminder";
