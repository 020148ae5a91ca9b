//! Time source used by quiet-hours checks and the reminder sweep.

use chrono::{Local, Timelike, Utc};

use crate::types::Timestamp;

/// Supplies the current instant and the current hour of the local day.
///
/// Quiet hours are configured by users in local wall-clock hours, so the
/// hour comes from the process timezone (`TZ`), not from UTC.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    fn local_hour(&self) -> u8;
}

/// Wall clock of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn local_hour(&self) -> u8 {
        // `hour()` is always within 0..=23.
        Local::now().hour() as u8
    }
}

/// A clock frozen at a given instant and local hour.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub now: Timestamp,
    pub local_hour: u8,
}

impl FixedClock {
    pub fn new(now: Timestamp, local_hour: u8) -> Self {
        Self { now, local_hour }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.now
    }

    fn local_hour(&self) -> u8 {
        self.local_hour
    }
}
