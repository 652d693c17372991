//! Cycle timestamp sources.

use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::Timestamp;

pub trait Clock {
    /// Current wall-clock time in milliseconds since the UNIX epoch.
    fn now_ms(&self) -> Timestamp;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as Timestamp)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Timestamp>,
    step: Timestamp,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        ManualClock {
            now: Cell::new(start),
            step: 0,
        }
    }

    /// Advance by `step` after every read.
    pub fn stepping(start: Timestamp, step: Timestamp) -> Self {
        ManualClock {
            now: Cell::new(start),
            step,
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Timestamp {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> Timestamp {
        (**self).now_ms()
    }
}

/// Next cycle timestamp: the clock reading, pushed past `previous` if the
/// wall clock stalled or stepped backwards.
pub fn next_cycle_timestamp(now: Timestamp, previous: Option<Timestamp>) -> Timestamp {
    match previous {
        Some(prev) => now.max(prev + 1),
        None => now,
    }
}
