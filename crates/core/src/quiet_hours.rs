//! Quiet-hours window evaluation.
//!
//! A window is given by a start and an end hour of the local day. When
//! `start_hour > end_hour` the window wraps past midnight (e.g. 22 → 7),
//! otherwise it lies within one day (e.g. 9 → 17). The end hour is
//! exclusive in both cases.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Per-user quiet-hours settings, embedded in `notificationSettings`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuietHours {
    pub enabled: bool,
    pub start_hour: u8,
    pub end_hour: u8,
}

impl QuietHours {
    /// Build an enabled window, rejecting hours outside `0..=23`.
    pub fn new(start_hour: u8, end_hour: u8) -> Result<Self, CoreError> {
        for hour in [start_hour, end_hour] {
            if hour > 23 {
                return Err(CoreError::InvalidHour(hour));
            }
        }
        Ok(Self {
            enabled: true,
            start_hour,
            end_hour,
        })
    }

    /// Whether `hour` falls inside the window, ignoring `enabled`.
    pub fn contains(&self, hour: u8) -> bool {
        in_window(self.start_hour, self.end_hour, hour)
    }

    /// Whether notifications are currently muted at local `hour`.
    pub fn is_active_at(&self, hour: u8) -> bool {
        self.enabled && self.contains(hour)
    }
}

/// The single quiet-hours formula shared by the gateway and the resolver.
pub fn in_window(start_hour: u8, end_hour: u8, hour: u8) -> bool {
    if start_hour > end_hour {
        hour >= start_hour || hour < end_hour
    } else {
        hour >= start_hour && hour < end_hour
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    // -----------------------------------------------------------------------
    // Overnight windows
    // -----------------------------------------------------------------------

    #[test]
    fn overnight_window_covers_late_evening() {
        assert!(in_window(22, 7, 23));
    }

    #[test]
    fn overnight_window_covers_early_morning() {
        assert!(in_window(22, 7, 6));
    }

    #[test]
    fn overnight_window_excludes_daytime() {
        assert!(!in_window(22, 7, 10));
    }

    #[test]
    fn overnight_window_end_hour_is_exclusive() {
        assert!(in_window(22, 7, 22));
        assert!(!in_window(22, 7, 7));
    }

    // -----------------------------------------------------------------------
    // Same-day windows
    // -----------------------------------------------------------------------

    #[test]
    fn same_day_window_covers_noon() {
        assert!(in_window(9, 17, 12));
    }

    #[test]
    fn same_day_window_excludes_evening() {
        assert!(!in_window(9, 17, 20));
    }

    #[test]
    fn equal_start_and_end_is_an_empty_window() {
        for hour in 0..24 {
            assert!(!in_window(5, 5, hour));
        }
    }

    #[test]
    fn formula_holds_for_every_triple() {
        for start in 0..24u8 {
            for end in 0..24u8 {
                for hour in 0..24u8 {
                    let expected = if start > end {
                        hour >= start || hour < end
                    } else {
                        hour >= start && hour < end
                    };
                    assert_eq!(in_window(start, end, hour), expected, "{start}-{end} @ {hour}");
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // QuietHours
    // -----------------------------------------------------------------------

    #[test]
    fn disabled_window_is_never_active() {
        let quiet = QuietHours {
            enabled: false,
            start_hour: 0,
            end_hour: 23,
        };
        assert!(quiet.contains(12));
        assert!(!quiet.is_active_at(12));
    }

    #[test]
    fn new_rejects_out_of_range_hours() {
        assert_matches!(QuietHours::new(24, 7), Err(CoreError::InvalidHour(24)));
        assert_matches!(QuietHours::new(22, 30), Err(CoreError::InvalidHour(30)));
        assert!(QuietHours::new(22, 7).unwrap().is_active_at(23));
    }

    #[test]
    fn deserializes_from_camel_case_document() {
        let quiet: QuietHours = serde_json::from_value(serde_json::json!({
            "enabled": true,
            "startHour": 22,
            "endHour": 7
        }))
        .unwrap();
        assert_eq!(quiet, QuietHours::new(22, 7).unwrap());
    }
}
