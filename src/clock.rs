// src/clock.rs

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::sync::{Arc, Mutex};

/// Source of "now". Views that depend on today's date take one of these so they can be
/// pinned in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct FixedClock {
    current_time: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(now)),
        }
    }

    /// Parses `YYYY-MM-DD HH:MM:SS` as UTC. Returns `None` on a malformed string.
    pub fn at(datetime_str: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| Self::new(dt.and_utc()))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.current_time.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, duration: chrono::Duration) {
        if let Ok(mut guard) = self.current_time.lock() {
            *guard += duration;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.current_time.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
