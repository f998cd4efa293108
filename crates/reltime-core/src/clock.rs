//! Clock sources.
//!
//! The formatter itself never reads a clock; callers and the refresh
//! scheduler pull `now` from a [`Clock`] so tests can substitute a
//! [`ManualClock`].

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use web_time::SystemTime;

use crate::instant::Instant;

/// A source of the current wall-clock instant.
pub trait Clock {
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Wall clock (`SystemTime::now`, also on wasm targets).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        SystemTime::now().into()
    }
}

/// Hand-driven clock for deterministic tests and replays.
///
/// Clones share the same underlying time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: Instant) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, now: Instant) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get().saturating_add(by));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}
