use serde::{Deserialize, Serialize};

use super::{null_default, parse_timestamp, Document};
use crate::types::{DocId, Timestamp};

/// Kind of a community event. Users subscribe to new events per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Minisraz,
    VelkySraz,
    Trackday,
    Vyjizdka,
    #[serde(other)]
    Other,
}

impl EventType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Minisraz => "Minisraz",
            Self::VelkySraz => "Velký sraz",
            Self::Trackday => "Trackday",
            Self::Vyjizdka => "Vyjížďka",
            Self::Other => "Akce",
        }
    }
}

/// An `events/{eventId}` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    #[serde(skip)]
    pub id: DocId,
    #[serde(deserialize_with = "null_default")]
    pub creator_id: DocId,
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    /// Start and end are only compared and displayed, so they are kept raw
    /// and any encoding the app writes is accepted.
    pub date: serde_json::Value,
    pub end_date: serde_json::Value,
    /// Either a plain address string or a place object; kept raw so that any
    /// change to it is detected.
    pub location: serde_json::Value,
    pub event_type: Option<EventType>,
    #[serde(deserialize_with = "null_default")]
    pub participants: Vec<DocId>,
}

impl Event {
    /// Start of the event, when `date` holds a readable instant or date.
    pub fn starts_at(&self) -> Option<Timestamp> {
        self.date.as_str().and_then(parse_timestamp)
    }

    /// Human-readable location: the string itself, or the `address`/`name`
    /// of a place object.
    pub fn location_label(&self) -> Option<&str> {
        match &self.location {
            serde_json::Value::String(s) if !s.is_empty() => Some(s),
            serde_json::Value::Object(place) => ["address", "name"]
                .iter()
                .find_map(|key| place.get(*key).and_then(|v| v.as_str()))
                .filter(|s| !s.is_empty()),
            _ => None,
        }
    }
}

impl Document for Event {
    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

/// An `events/{eventId}/comments/{commentId}` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventComment {
    #[serde(skip)]
    pub id: DocId,
    #[serde(deserialize_with = "null_default")]
    pub event_id: DocId,
    #[serde(deserialize_with = "null_default")]
    pub user_id: DocId,
    #[serde(deserialize_with = "null_default")]
    pub user_name: String,
    #[serde(deserialize_with = "null_default")]
    pub text: String,
}

impl Document for EventComment {
    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}
