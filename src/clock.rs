//! Clock capability for the period engine.
//!
//! Rollover detection compares "now" against the persisted active period, so
//! the current time is injected rather than read from ambient global state.
//! Production code uses [`SystemClock`]; tests substitute [`FixedClock`] to
//! drive month transitions deterministically.

use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDateTime};

/// Source of the current local wall-clock time.
///
/// The engine deliberately works in naive local time: periods are calendar
/// months on the device clock, with no timezone normalization.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the device's local time.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Manually controlled clock for deterministic tests.
///
/// Clones share the same underlying instant, so a test can hold on to the
/// clock it handed to the engine and advance it mid-test.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl FixedClock {
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Move the clock to a new instant.
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}
