use serde::{Deserialize, Serialize};

use super::{null_default, Document};
use crate::types::DocId;

/// What kind of help a stranded driver is asking for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeaconType {
    Breakdown,
    FlatTire,
    OutOfFuel,
    DeadBattery,
    Accident,
    #[default]
    #[serde(other)]
    Other,
}

impl BeaconType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Breakdown => "Porucha",
            Self::FlatTire => "Defekt",
            Self::OutOfFuel => "Došlo palivo",
            Self::DeadBattery => "Vybitá baterie",
            Self::Accident => "Nehoda",
            Self::Other => "Potřebuje pomoc",
        }
    }
}

/// Beacon lifecycle: `active` → `help_coming` → `resolved`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeaconStatus {
    #[default]
    Active,
    HelpComing,
    Resolved,
    /// A status this engine does not know; no transition from or to it is
    /// announced.
    #[serde(other)]
    Other,
}

/// A `helpBeacons/{beaconId}` document ("SOS").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HelpBeacon {
    #[serde(skip)]
    pub id: DocId,
    /// The stranded user who created the beacon.
    #[serde(deserialize_with = "null_default")]
    pub user_id: DocId,
    #[serde(deserialize_with = "null_default")]
    pub display_name: String,
    #[serde(deserialize_with = "null_default")]
    pub beacon_type: BeaconType,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub status: BeaconStatus,
    pub helper_id: Option<DocId>,
    pub helper_name: Option<String>,
}

impl HelpBeacon {
    /// The description, if present and not blank.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().map(str::trim).filter(|d| !d.is_empty())
    }
}

impl Document for HelpBeacon {
    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}
