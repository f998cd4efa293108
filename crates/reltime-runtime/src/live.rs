#![forbid(unsafe_code)]

//! Self-refreshing relative-time element.
//!
//! [`LiveTimeAgo`] binds one `since` instant to a [`RefreshScheduler`]
//! subscription and keeps its latest [`Formatted`] output. A rendering
//! adapter reads [`LiveTimeAgo::output`] after each scheduler step.
//!
//! # Invariants
//!
//! 1. **At most one timer**: changing the auto-update cadence reconfigures
//!    the existing subscription instead of adding another.
//! 2. **Stops on expiry**: once the output switches to the absolute
//!    rendering (max age exceeded), the subscription is stopped and no
//!    further ticks arrive.
//! 3. **Teardown**: dropping the element drops its subscription.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unknown locale at construction | locale not registered | `new` returns the error |
//! | Unknown locale on a tick | current locale switched to an unregistered id | error stored in `output()`, `warn!` logged, ticking continues |

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use reltime_core::{Clock, FormatError, FormatOptions, Formatted, Instant, format};
use reltime_i18n::LocaleContext;
use tracing::{debug, warn};

use crate::scheduler::{RefreshInterval, RefreshScheduler, Subscription};

/// Locale registry shared between elements and the code that switches
/// locales.
pub type SharedLocales = Rc<RefCell<LocaleContext>>;

struct LiveState {
    since: Instant,
    options: FormatOptions,
    locales: SharedLocales,
    clock: Rc<dyn Clock>,
    output: Result<Formatted, FormatError>,
    refreshes: u64,
    subscription: Option<Subscription>,
}

impl LiveState {
    fn recompute(&self) -> Result<Formatted, FormatError> {
        let now = self.clock.now();
        let locales = self.locales.borrow();
        format(&locales, now, self.since, &self.options)
    }
}

/// Recompute, store, and stop refreshing once expired.
fn refresh_state(state: &RefCell<LiveState>) -> Result<Formatted, FormatError> {
    let (output, expired_sub) = {
        let mut s = state.borrow_mut();
        let output = s.recompute();
        if let Err(err) = &output {
            warn!(error = %err, since = %s.since, "relative time refresh failed");
        }
        let expired = matches!(&output, Ok(f) if f.expired);
        s.output = output.clone();
        s.refreshes += 1;
        (output, if expired { s.subscription.take() } else { None })
    };
    if let Some(sub) = expired_sub {
        debug!(id = ?sub.id(), "max age exceeded; refresh stopped");
        sub.stop();
    }
    output
}

/// A relative-time display that refreshes itself on a scheduler.
pub struct LiveTimeAgo {
    state: Rc<RefCell<LiveState>>,
    scheduler: RefreshScheduler,
    auto_update: RefreshInterval,
}

impl fmt::Debug for LiveTimeAgo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.state.borrow();
        f.debug_struct("LiveTimeAgo")
            .field("since", &s.since)
            .field("auto_update", &self.auto_update)
            .field("output", &s.output)
            .field("refreshing", &s.subscription.is_some())
            .finish()
    }
}

impl LiveTimeAgo {
    /// Format immediately and, unless `auto_update` is disabled or the
    /// output already expired, start refreshing.
    pub fn new(
        scheduler: &RefreshScheduler,
        locales: SharedLocales,
        since: Instant,
        options: FormatOptions,
        auto_update: impl Into<RefreshInterval>,
    ) -> Result<Self, FormatError> {
        let clock = scheduler.clock();
        let output = {
            let ctx = locales.borrow();
            format(&ctx, clock.now(), since, &options)?
        };
        let expired = output.expired;
        let live = Self {
            state: Rc::new(RefCell::new(LiveState {
                since,
                options,
                locales,
                clock,
                output: Ok(output),
                refreshes: 0,
                subscription: None,
            })),
            scheduler: scheduler.clone(),
            auto_update: auto_update.into(),
        };
        if !expired {
            live.ensure_subscription();
        }
        Ok(live)
    }

    fn ensure_subscription(&self) {
        if !self.auto_update.is_enabled() {
            return;
        }
        let mut s = self.state.borrow_mut();
        if let Some(sub) = s.subscription.as_ref() {
            sub.reconfigure(self.auto_update);
            return;
        }
        let weak: Weak<RefCell<LiveState>> = Rc::downgrade(&self.state);
        let sub = self.scheduler.start(self.auto_update, move || {
            if let Some(state) = weak.upgrade() {
                let _ = refresh_state(&state);
            }
        });
        s.subscription = Some(sub);
    }

    /// Latest output.
    #[must_use]
    pub fn output(&self) -> Result<Formatted, FormatError> {
        self.state.borrow().output.clone()
    }

    /// Latest display text, if the last refresh succeeded.
    #[must_use]
    pub fn display(&self) -> Option<String> {
        self.state
            .borrow()
            .output
            .as_ref()
            .ok()
            .map(|f| f.display.clone())
    }

    /// Machine-readable timestamp of `since` (RFC 3339, UTC).
    #[must_use]
    pub fn datetime(&self) -> String {
        self.state.borrow().since.to_rfc3339()
    }

    #[must_use]
    pub fn since(&self) -> Instant {
        self.state.borrow().since
    }

    #[must_use]
    pub fn auto_update(&self) -> RefreshInterval {
        self.auto_update
    }

    /// Whether a refresh timer is currently armed for this element.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.state
            .borrow()
            .subscription
            .as_ref()
            .is_some_and(|sub| sub.interval().is_enabled())
    }

    /// Completed refreshes, not counting the initial format.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.state.borrow().refreshes
    }

    /// Re-read the clock and recompute now, outside the timer cadence.
    pub fn refresh(&self) -> Result<Formatted, FormatError> {
        refresh_state(&self.state)
    }

    /// Change the cadence. Disabling tears the timer down; enabling again
    /// restarts it unless the output has expired.
    pub fn set_auto_update(&mut self, interval: impl Into<RefreshInterval>) {
        self.auto_update = interval.into();
        if self.auto_update.is_enabled() {
            if !self.is_expired() {
                self.ensure_subscription();
            }
        } else if let Some(sub) = self.state.borrow().subscription.as_ref() {
            sub.reconfigure(RefreshInterval::Disabled);
        }
    }

    /// Point the element at a new instant. Refreshing resumes if the new
    /// instant is within the max age.
    pub fn set_since(&self, since: Instant) -> Result<Formatted, FormatError> {
        self.state.borrow_mut().since = since;
        self.reformat()
    }

    /// Replace the formatting options.
    pub fn set_options(&self, options: FormatOptions) -> Result<Formatted, FormatError> {
        self.state.borrow_mut().options = options;
        self.reformat()
    }

    fn reformat(&self) -> Result<Formatted, FormatError> {
        let output = refresh_state(&self.state)?;
        if !output.expired {
            self.ensure_subscription();
        }
        Ok(output)
    }

    fn is_expired(&self) -> bool {
        matches!(&self.state.borrow().output, Ok(f) if f.expired)
    }
}
