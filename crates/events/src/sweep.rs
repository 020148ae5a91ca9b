//! Daily vehicle reminder sweep.
//!
//! [`ReminderSweep`] runs once a day at a configured local time. It walks
//! every user opted in to vehicle reminders, checks the expiration dates on
//! their cars and sends a notice when a reminder is exactly at one of its
//! warning thresholds, plus a separate notice on the expiry day itself.
//! Nothing is written back; the reminders are read-only here.

use std::sync::Arc;

use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};
use garage_core::channels::CHANNEL_REMINDERS;
use garage_core::clock::Clock;
use garage_core::models::{Car, VehicleReminder};
use garage_core::notification_types::TYPE_VEHICLE_REMINDER;
use garage_core::reminders::{alerts_for, days_left, ReminderAlert, ReminderCatalog, ReminderConfig};
use garage_core::settings::Category;
use garage_core::text;
use garage_db::{DocumentStore, StoreError};
use tokio_util::sync::CancellationToken;

use crate::delivery::{PushGateway, PushMessage};

// ---------------------------------------------------------------------------
// SweepReport
// ---------------------------------------------------------------------------

/// Counts from one sweep run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Users opted in to reminders that have a device token.
    pub users: usize,
    /// Cars inspected.
    pub cars: usize,
    /// Notifications handed to the gateway.
    pub sent: usize,
    /// Notifications the push service confirmed.
    pub delivered: usize,
}

// ---------------------------------------------------------------------------
// ReminderSweep
// ---------------------------------------------------------------------------

/// Background service that sends vehicle reminder notifications daily.
pub struct ReminderSweep {
    store: Arc<dyn DocumentStore>,
    gateway: PushGateway,
    clock: Arc<dyn Clock>,
    catalog: ReminderCatalog,
}

impl ReminderSweep {
    pub fn new(store: Arc<dyn DocumentStore>, gateway: PushGateway, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            gateway,
            clock,
            catalog: ReminderCatalog::default(),
        }
    }

    /// Replace the reminder catalog.
    pub fn with_catalog(mut self, catalog: ReminderCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Run the scheduler loop.
    ///
    /// Sleeps until the next local `at`, sweeps, and repeats. The loop exits
    /// when the provided [`CancellationToken`] is cancelled.
    pub async fn run(&self, at: NaiveTime, cancel: CancellationToken) {
        loop {
            let now = self.clock.now().with_timezone(&Local);
            let next = next_run_after(&now, at);
            let wait = (next.clone() - now).to_std().unwrap_or_default();
            tracing::info!(next_run = %next, "Reminder sweep scheduled");

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Reminder sweep cancelled");
                    break;
                }
                _ = tokio::time::sleep(wait) => {
                    self.run_logged().await;
                }
            }
        }
    }

    /// Sweep once and log the outcome.
    pub async fn run_logged(&self) -> Option<SweepReport> {
        match self.run_once().await {
            Ok(report) => {
                tracing::info!(
                    users = report.users,
                    cars = report.cars,
                    sent = report.sent,
                    delivered = report.delivered,
                    "Reminder sweep finished"
                );
                Some(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "Reminder sweep aborted");
                None
            }
        }
    }

    /// Check every opted-in user's cars and send due reminders.
    ///
    /// Sends are serial. A store error ends the run early.
    pub async fn run_once(&self) -> Result<SweepReport, StoreError> {
        let now = self.clock.now();
        let mut report = SweepReport::default();

        let users = self.store.list_users().await?;
        for user in &users {
            let settings = &user.notification_settings;
            if !settings.allows(Category::VehicleReminders) {
                continue;
            }
            let Some(token) = user.push_token() else {
                continue;
            };
            report.users += 1;

            let cars = self.store.list_cars_by_owner(&user.uid).await?;
            for car in &cars {
                report.cars += 1;
                for reminder in car.reminders.iter().filter(|r| r.notify_enabled) {
                    let Some(expiration) = reminder.expiration_date else {
                        continue;
                    };
                    let Some(config) = self.catalog.get(reminder.reminder_type) else {
                        continue;
                    };

                    let days = days_left(expiration, now);
                    for alert in alerts_for(config, days) {
                        let message = reminder_message(token, car, reminder, config, alert);
                        report.sent += 1;
                        if self.gateway.send(&message, Some(&settings.quiet_hours)).await {
                            report.delivered += 1;
                        }
                    }
                }
            }
        }

        Ok(report)
    }
}

/// Build the notice for one reminder alert.
pub fn reminder_message(
    token: &str,
    car: &Car,
    reminder: &VehicleReminder,
    config: &ReminderConfig,
    alert: ReminderAlert,
) -> PushMessage {
    let car_name = car.display_name();
    let (title, body, days) = match alert {
        ReminderAlert::ExpiresIn(days) => (
            format!("🔔 Připomínka: {}", config.label),
            format!("{} pro {car_name} vyprší za {}", config.label, text::days(days)),
            days,
        ),
        ReminderAlert::ExpiresToday => (
            format!("⚠️ {} vyprší dnes", config.label),
            format!("{} pro {car_name} vyprší dnes", config.label),
            0,
        ),
    };

    PushMessage::new(token, CHANNEL_REMINDERS, TYPE_VEHICLE_REMINDER, title, body)
        .with_data("carId", &car.id)
        .with_data("reminderType", reminder.reminder_type.as_str())
        .with_data("daysLeft", days.to_string())
}

/// The first local occurrence of `at` strictly after `now`.
///
/// When `at` falls into a daylight-saving gap, the run moves one hour later.
pub fn next_run_after<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut date = now.date_naive();

    for _ in 0..3 {
        let naive = date.and_time(at);
        let candidate = tz
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| tz.from_local_datetime(&(naive + chrono::Duration::hours(1))).earliest());
        if let Some(candidate) = candidate {
            if candidate > *now {
                return candidate;
            }
        }
        match date.checked_add_days(Days::new(1)) {
            Some(next) => date = next,
            None => break,
        }
    }

    now.clone() + chrono::Duration::days(1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    fn prague_summer() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn next_run_later_today() {
        let now = prague_summer().with_ymd_and_hms(2026, 10, 16, 7, 30, 0).unwrap();
        let next = next_run_after(&now, nine());
        assert_eq!(next, prague_summer().with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap());
    }

    #[test]
    fn next_run_tomorrow_once_time_has_passed() {
        let now = prague_summer().with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let next = next_run_after(&now, nine());
        assert_eq!(next, prague_summer().with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap());
    }

    #[test]
    fn next_run_crosses_month_end() {
        let now = prague_summer().with_ymd_and_hms(2026, 10, 31, 22, 0, 0).unwrap();
        let next = next_run_after(&now, nine());
        assert_eq!(next, prague_summer().with_ymd_and_hms(2026, 11, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn reminder_message_uses_czech_plural() {
        let car = Car {
            id: "c1".into(),
            name: "Fabka".into(),
            ..Default::default()
        };
        let reminder = VehicleReminder {
            reminder_type: garage_core::models::ReminderType::HighwayVignette,
            expiration_date: None,
            notify_enabled: true,
        };
        let catalog = ReminderCatalog::default();
        let config = catalog.get(reminder.reminder_type).unwrap();

        let message = reminder_message("tok", &car, &reminder, config, ReminderAlert::ExpiresIn(7));
        assert_eq!(message.notification.body, "Dálniční známka pro Fabka vyprší za 7 dní");
        assert_eq!(message.channel_id, "reminders");
        assert_eq!(message.data["reminderType"], "highway_vignette");
        assert_eq!(message.data["daysLeft"], "7");

        let today = reminder_message("tok", &car, &reminder, config, ReminderAlert::ExpiresToday);
        assert!(today.notification.body.ends_with("vyprší dnes"));
    }
}
