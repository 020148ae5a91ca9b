//! Documents read by the notification engine.
//!
//! The schemas are owned by the mobile application. Only the fields that
//! drive notification decisions are modelled; unknown fields are ignored and
//! missing or `null` fields fall back to their empty/false defaults.

pub mod beacon;
pub mod chat;
pub mod event;
pub mod marketplace;
pub mod user;
pub mod vehicle;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::types::Timestamp;

pub use beacon::{BeaconStatus, BeaconType, HelpBeacon};
pub use chat::{ChatMessage, ChatRoom};
pub use event::{Event, EventComment, EventType};
pub use marketplace::{ListingType, MarketplaceListing};
pub use user::{Badge, UserProfile};
pub use vehicle::{Car, ReminderType, VehicleReminder};

/// A model stored as a document whose key lives in its path, not its body.
pub trait Document: DeserializeOwned {
    fn set_id(&mut self, id: &str);
}

/// Decode a document body and attach the key taken from its path.
pub fn decode<T: Document>(id: &str, data: serde_json::Value) -> Result<T, serde_json::Error> {
    let mut doc: T = serde_json::from_value(data)?;
    doc.set_id(id);
    Ok(doc)
}

/// Deserialize `null` as `T::default()`.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse an RFC 3339 instant or a plain `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// Deserialize a date field leniently: anything [`parse_timestamp`] cannot
/// read becomes `None` instead of failing the whole document.
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => parse_timestamp(&s),
        _ => None,
    })
}

/// Deserialize a list element by element, dropping the elements that do not
/// decode. A value that is not a list yields an empty one.
pub(crate) fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}
