use serde::{Deserialize, Serialize};

use super::{lenient_timestamp, lenient_vec, null_default, Document};
use crate::types::{DocId, Timestamp};

/// Kind of a document or consumable with an expiration date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    /// Technical inspection (STK).
    Stk,
    FirstAidKit,
    HighwayVignette,
    LiabilityInsurance,
    #[serde(other)]
    Other,
}

impl ReminderType {
    /// The value stored in the document's `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stk => "stk",
            Self::FirstAidKit => "first_aid_kit",
            Self::HighwayVignette => "highway_vignette",
            Self::LiabilityInsurance => "liability_insurance",
            Self::Other => "other",
        }
    }
}

/// One expiring item tracked on a car.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleReminder {
    #[serde(rename = "type")]
    pub reminder_type: ReminderType,
    /// An RFC 3339 instant or a plain date; unreadable values count as unset.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub expiration_date: Option<Timestamp>,
    #[serde(default, deserialize_with = "null_default")]
    pub notify_enabled: bool,
}

/// A `cars/{carId}` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Car {
    #[serde(skip)]
    pub id: DocId,
    #[serde(deserialize_with = "null_default")]
    pub owner_id: DocId,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub make: String,
    #[serde(deserialize_with = "null_default")]
    pub model: String,
    /// Reminders that fail to decode are dropped, the rest are kept.
    #[serde(deserialize_with = "lenient_vec")]
    pub reminders: Vec<VehicleReminder>,
    #[serde(deserialize_with = "null_default")]
    pub for_sale: bool,
}

impl Car {
    /// `make model`, without stray spaces when either is missing.
    pub fn make_and_model(&self) -> String {
        [self.make.trim(), self.model.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The owner's nickname for the car, falling back to make and model.
    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            self.make_and_model()
        } else {
            name.to_string()
        }
    }
}

impl Document for Car {
    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::decode;

    #[test]
    fn decodes_reminders() {
        let car: Car = decode(
            "c1",
            json!({
                "ownerId": "u1",
                "name": "Fabka",
                "make": "Škoda",
                "model": "Fabia",
                "reminders": [
                    { "type": "stk", "expirationDate": "2027-01-15T00:00:00Z", "notifyEnabled": true },
                    { "type": "first_aid_kit", "notifyEnabled": false }
                ]
            }),
        )
        .unwrap();
        assert_eq!(car.reminders.len(), 2);
        assert_eq!(car.reminders[0].reminder_type, ReminderType::Stk);
        assert!(car.reminders[0].expiration_date.is_some());
        assert!(car.reminders[1].expiration_date.is_none());
        assert!(!car.for_sale);
    }

    #[test]
    fn plain_date_expirations_are_accepted() {
        let car: Car = decode(
            "c1",
            json!({
                "reminders": [
                    { "type": "stk", "expirationDate": "2026-11-15", "notifyEnabled": true },
                    { "type": "highway_vignette", "expirationDate": "soon", "notifyEnabled": true }
                ]
            }),
        )
        .unwrap();
        assert_eq!(
            car.reminders[0].expiration_date.map(|d| d.to_rfc3339()),
            Some("2026-11-15T00:00:00+00:00".to_string())
        );
        assert_eq!(car.reminders[1].expiration_date, None);
    }

    #[test]
    fn broken_reminder_does_not_drop_the_car() {
        let car: Car = decode(
            "c1",
            json!({
                "make": "Škoda",
                "reminders": [
                    { "expirationDate": "2026-11-15", "notifyEnabled": true },
                    "stk",
                    { "type": "stk", "expirationDate": "2026-11-15", "notifyEnabled": true }
                ]
            }),
        )
        .unwrap();
        assert_eq!(car.reminders.len(), 1);
        assert_eq!(car.reminders[0].reminder_type, ReminderType::Stk);

        let car: Car = decode("c2", json!({ "make": "Škoda", "reminders": { "stk": true } })).unwrap();
        assert!(car.reminders.is_empty());
    }

    #[test]
    fn display_name_falls_back_to_make_and_model() {
        let car = Car {
            make: "Škoda".into(),
            model: "Octavia".into(),
            ..Default::default()
        };
        assert_eq!(car.display_name(), "Škoda Octavia");

        let named = Car {
            name: " Bestie ".into(),
            ..car
        };
        assert_eq!(named.display_name(), "Bestie");
    }
}
