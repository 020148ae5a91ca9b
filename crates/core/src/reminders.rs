//! Vehicle reminder thresholds.
//!
//! Each reminder type has a fixed label and a list of "days before expiry"
//! at which the owner is warned. The sweep also sends a separate
//! "expires today" notice when zero days are left. Both checks are
//! independent: a catalog that lists `0` as a threshold produces two alerts
//! on the expiry day.

use std::collections::HashMap;

use crate::models::ReminderType;
use crate::types::Timestamp;

const DAY_MILLIS: f64 = 86_400_000.0;

/// Label and warning thresholds for one reminder type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderConfig {
    pub label: String,
    pub warning_days: Vec<i64>,
}

/// Lookup table from reminder type to its configuration.
#[derive(Debug, Clone)]
pub struct ReminderCatalog {
    entries: HashMap<ReminderType, ReminderConfig>,
}

impl Default for ReminderCatalog {
    fn default() -> Self {
        let entries = [
            (ReminderType::Stk, "STK", vec![90, 30]),
            (ReminderType::FirstAidKit, "Lékárnička", vec![30]),
            (ReminderType::HighwayVignette, "Dálniční známka", vec![30, 7]),
            (ReminderType::LiabilityInsurance, "Povinné ručení", vec![60]),
        ]
        .into_iter()
        .map(|(t, label, warning_days)| {
            (
                t,
                ReminderConfig {
                    label: label.to_string(),
                    warning_days,
                },
            )
        })
        .collect();
        Self { entries }
    }
}

impl ReminderCatalog {
    pub fn get(&self, reminder_type: ReminderType) -> Option<&ReminderConfig> {
        self.entries.get(&reminder_type)
    }

    /// Replace the thresholds of one type, keeping its label.
    pub fn with_warning_days(mut self, reminder_type: ReminderType, days: Vec<i64>) -> Self {
        if let Some(config) = self.entries.get_mut(&reminder_type) {
            config.warning_days = days;
        }
        self
    }
}

/// A notification the sweep should emit for one reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderAlert {
    /// `days_left` matched a configured threshold.
    ExpiresIn(i64),
    /// The reminder expires today.
    ExpiresToday,
}

/// Whole days until `expiration`, rounded up.
pub fn days_left(expiration: Timestamp, now: Timestamp) -> i64 {
    let millis = (expiration - now).num_milliseconds() as f64;
    (millis / DAY_MILLIS).ceil() as i64
}

/// Alerts due for a reminder with `days_left` remaining.
pub fn alerts_for(config: &ReminderConfig, days_left: i64) -> Vec<ReminderAlert> {
    let mut alerts = Vec::new();
    if config.warning_days.contains(&days_left) {
        alerts.push(ReminderAlert::ExpiresIn(days_left));
    }
    if days_left == 0 {
        alerts.push(ReminderAlert::ExpiresToday);
    }
    alerts
}
