//! Time source shared by the quota and session stores.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Supplies the current instant and calendar date.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current instant, used for session ages.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date, used for the daily quota boundary.
    fn today(&self) -> NaiveDate;
}

/// Wall clock; the quota day follows the host's local date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, to: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = to;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|_| Utc::now())
    }

    /// The manual clock counts days in UTC so tests are independent of the host zone.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}
