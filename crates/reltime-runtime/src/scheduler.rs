#![forbid(unsafe_code)]

//! Host-driven periodic refresh timers.
//!
//! [`RefreshScheduler`] owns no thread and never blocks. The host event loop
//! calls [`RefreshScheduler::step`] whenever it wakes up (ideally at
//! [`RefreshScheduler::next_deadline`]); every timer that is due fires once.
//!
//! ```text
//! host loop
//!   → sleep until next_deadline()
//!   → step()                 // read clock, fire due timers, reschedule
//!   → render what changed
//! ```
//!
//! # Invariants
//!
//! 1. **One timer per subscription**: a [`Subscription`] has either no timer
//!    (disabled) or exactly one. Reconfiguring replaces it.
//! 2. **No stacking**: a timer that fell behind fires once per step and is
//!    rescheduled one period after the step's `now`.
//! 3. **Synchronous cancellation**: after [`Subscription::stop`] returns, the
//!    callback never runs again, including later in the step that is
//!    currently executing.
//! 4. **Scoped teardown**: dropping a [`Subscription`] stops it.
//! 5. **Millisecond resolution**: periods are rounded up to whole
//!    milliseconds (at least one), so a timer never fires twice without the
//!    clock moving.
//!
//! # Failure Modes
//!
//! - **Re-entrant step**: calling `step()` from inside a tick callback whose
//!   own timer is due again panics (`RefCell` borrow rules). Starting,
//!   stopping and reconfiguring from inside callbacks is fine: no scheduler
//!   borrow is held while a callback runs.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use reltime_core::{Clock, Instant, SystemClock};
use tracing::{debug, trace};

/// Refresh cadence. Non-positive, non-finite or absent cadences disable the
/// timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshInterval {
    #[default]
    Disabled,
    Every(Duration),
}

impl RefreshInterval {
    /// Cadence in (possibly fractional) seconds; `<= 0` disables.
    #[must_use]
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs > 0.0 {
            Duration::try_from_secs_f64(secs).map_or(Self::Disabled, Self::from)
        } else {
            Self::Disabled
        }
    }

    #[must_use]
    pub fn period(self) -> Option<Duration> {
        match self {
            Self::Disabled => None,
            Self::Every(d) => Some(d),
        }
    }

    #[must_use]
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Every(_))
    }
}

impl From<Duration> for RefreshInterval {
    fn from(d: Duration) -> Self {
        if d.is_zero() {
            Self::Disabled
        } else {
            Self::Every(d)
        }
    }
}

impl From<Option<Duration>> for RefreshInterval {
    fn from(d: Option<Duration>) -> Self {
        d.map_or(Self::Disabled, Self::from)
    }
}

impl From<f64> for RefreshInterval {
    fn from(secs: f64) -> Self {
        Self::from_secs_f64(secs)
    }
}

/// Identifier of a subscription within its scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubId(u64);

type TickFn = Rc<RefCell<dyn FnMut()>>;

#[derive(Debug, Clone, Copy)]
struct Timer {
    period: Duration,
    due: Instant,
}

struct Entry {
    on_tick: TickFn,
    timer: Option<Timer>,
    ticks: u64,
}

struct SchedulerInner {
    clock: Rc<dyn Clock>,
    entries: BTreeMap<SubId, Entry>,
    next_id: u64,
}

/// Round up to whole milliseconds, the clock's resolution, so a timer is
/// never due at the instant it was armed.
fn clock_period(period: Duration) -> Duration {
    let millis = period.as_nanos().div_ceil(1_000_000).max(1);
    Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}

impl SchedulerInner {
    fn arm(&self, interval: RefreshInterval) -> Option<Timer> {
        interval.period().map(|period| {
            let period = clock_period(period);
            Timer {
                period,
                due: self.clock.now().saturating_add(period),
            }
        })
    }
}

/// Outcome of a single [`RefreshScheduler::step`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepResult {
    /// Clock reading used for this step.
    pub now: Instant,
    /// Callbacks invoked.
    pub ticks_fired: u32,
    /// Timers still armed after the step.
    pub active_timers: usize,
}

/// Single-threaded timer registry driven by the host loop.
///
/// Cloning creates a new handle to the same scheduler.
#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("RefreshScheduler")
            .field("subscriptions", &inner.entries.len())
            .field("next_id", &inner.next_id)
            .finish()
    }
}

impl RefreshScheduler {
    /// Create a scheduler reading `clock`.
    #[must_use]
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self::with_shared_clock(Rc::new(clock))
    }

    /// Create a scheduler sharing an existing clock handle.
    #[must_use]
    pub fn with_shared_clock(clock: Rc<dyn Clock>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                clock,
                entries: BTreeMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Scheduler on the wall clock.
    #[must_use]
    pub fn system() -> Self {
        Self::new(SystemClock)
    }

    /// The clock this scheduler reads.
    #[must_use]
    pub fn clock(&self) -> Rc<dyn Clock> {
        Rc::clone(&self.inner.borrow().clock)
    }

    #[must_use]
    pub fn now(&self) -> Instant {
        self.inner.borrow().clock.now()
    }

    /// Register `on_tick` to run every `interval`.
    ///
    /// A disabled interval registers the callback without a timer; it stays
    /// silent until [`Subscription::reconfigure`] enables it.
    pub fn start(
        &self,
        interval: impl Into<RefreshInterval>,
        on_tick: impl FnMut() + 'static,
    ) -> Subscription {
        let interval = interval.into();
        let mut inner = self.inner.borrow_mut();
        let id = SubId(inner.next_id);
        inner.next_id += 1;
        let timer = inner.arm(interval);
        inner.entries.insert(
            id,
            Entry {
                on_tick: Rc::new(RefCell::new(on_tick)),
                timer,
                ticks: 0,
            },
        );
        debug!(id = id.0, ?interval, "refresh subscription started");
        Subscription {
            id,
            scheduler: Rc::downgrade(&self.inner),
        }
    }

    /// Fire every due timer once and reschedule it.
    ///
    /// Timers fire in subscription order. A subscription stopped or
    /// reconfigured by an earlier callback in the same step is skipped.
    pub fn step(&self) -> StepResult {
        let now = self.now();
        let due: Vec<SubId> = self
            .inner
            .borrow()
            .entries
            .iter()
            .filter(|(_, e)| e.timer.is_some_and(|t| t.due <= now))
            .map(|(id, _)| *id)
            .collect();

        let mut ticks_fired = 0;
        for id in due {
            let on_tick = {
                let mut inner = self.inner.borrow_mut();
                let Some(entry) = inner.entries.get_mut(&id) else {
                    continue;
                };
                let Some(timer) = entry.timer.as_mut() else {
                    continue;
                };
                if timer.due > now {
                    continue;
                }
                timer.due = now.saturating_add(timer.period);
                entry.ticks += 1;
                trace!(id = id.0, tick = entry.ticks, "refresh tick");
                Rc::clone(&entry.on_tick)
            };
            (&mut *on_tick.borrow_mut())();
            ticks_fired += 1;
        }

        StepResult {
            now,
            ticks_fired,
            active_timers: self.active_timers(),
        }
    }

    /// Earliest due time among armed timers.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.inner
            .borrow()
            .entries
            .values()
            .filter_map(|e| e.timer.map(|t| t.due))
            .min()
    }

    /// Number of armed timers.
    #[must_use]
    pub fn active_timers(&self) -> usize {
        self.inner
            .borrow()
            .entries
            .values()
            .filter(|e| e.timer.is_some())
            .count()
    }

    /// Number of live (not stopped) subscriptions, armed or not.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }
}

/// Handle to one refresh registration.
///
/// Stopping is idempotent and also happens on drop.
pub struct Subscription {
    id: SubId,
    scheduler: Weak<RefCell<SchedulerInner>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Subscription {
    #[must_use]
    pub fn id(&self) -> SubId {
        self.id
    }

    /// Tear down the timer and drop the callback. No-op if already stopped
    /// or if the scheduler is gone.
    pub fn stop(&self) {
        let Some(inner) = self.scheduler.upgrade() else {
            return;
        };
        // Bind the entry so its callback is dropped after the borrow ends.
        let removed = inner.borrow_mut().entries.remove(&self.id);
        if removed.is_some() {
            debug!(id = self.id.0, "refresh subscription stopped");
        }
    }

    /// Replace the timer with one at `interval`, first due one period from
    /// now. A disabled interval only tears the timer down. Ignored once
    /// stopped.
    pub fn reconfigure(&self, interval: impl Into<RefreshInterval>) {
        let interval = interval.into();
        let Some(inner) = self.scheduler.upgrade() else {
            return;
        };
        let mut inner = inner.borrow_mut();
        let timer = inner.arm(interval);
        match inner.entries.get_mut(&self.id) {
            Some(entry) => {
                entry.timer = timer;
                debug!(id = self.id.0, ?interval, "refresh subscription reconfigured");
            }
            None => debug!(id = self.id.0, "reconfigure ignored: subscription stopped"),
        }
    }

    /// Whether the subscription has not been stopped.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.scheduler
            .upgrade()
            .is_some_and(|inner| inner.borrow().entries.contains_key(&self.id))
    }

    /// Current cadence; `Disabled` once stopped.
    #[must_use]
    pub fn interval(&self) -> RefreshInterval {
        self.scheduler
            .upgrade()
            .and_then(|inner| {
                inner
                    .borrow()
                    .entries
                    .get(&self.id)
                    .and_then(|e| e.timer.map(|t| RefreshInterval::Every(t.period)))
            })
            .unwrap_or_default()
    }

    /// Ticks delivered so far; 0 once stopped.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.scheduler
            .upgrade()
            .and_then(|inner| inner.borrow().entries.get(&self.id).map(|e| e.ticks))
            .unwrap_or(0)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reltime_core::ManualClock;
    use std::cell::Cell;

    fn setup() -> (ManualClock, RefreshScheduler) {
        let clock = ManualClock::new(Instant::from_millis(1_000_000));
        let scheduler = RefreshScheduler::new(clock.clone());
        (clock, scheduler)
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnMut() + 'static) {
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        (count, move || c.set(c.get() + 1))
    }

    #[test]
    fn interval_parsing() {
        assert_eq!(RefreshInterval::from_secs_f64(0.0), RefreshInterval::Disabled);
        assert_eq!(RefreshInterval::from_secs_f64(-3.0), RefreshInterval::Disabled);
        assert_eq!(RefreshInterval::from_secs_f64(f64::NAN), RefreshInterval::Disabled);
        assert_eq!(RefreshInterval::from_secs_f64(f64::INFINITY), RefreshInterval::Disabled);
        assert_eq!(
            RefreshInterval::from(1.5),
            RefreshInterval::Every(Duration::from_millis(1500))
        );
        assert_eq!(RefreshInterval::from(Duration::ZERO), RefreshInterval::Disabled);
        assert_eq!(RefreshInterval::from(None), RefreshInterval::Disabled);
    }

    #[test]
    fn stop_before_first_tick_fires_nothing() {
        let (clock, scheduler) = setup();
        let (count, tick) = counter();
        let sub = scheduler.start(5.0, tick);
        clock.advance(Duration::from_secs(4));
        scheduler.step();
        sub.stop();
        clock.advance(Duration::from_secs(10));
        let r = scheduler.step();
        assert_eq!(count.get(), 0);
        assert_eq!(r.ticks_fired, 0);
        assert_eq!(r.active_timers, 0);
    }

    #[test]
    fn fires_at_cadence() {
        let (clock, scheduler) = setup();
        let (count, tick) = counter();
        let sub = scheduler.start(5.0, tick);

        clock.advance(Duration::from_millis(4999));
        assert_eq!(scheduler.step().ticks_fired, 0);
        clock.advance(Duration::from_millis(1));
        assert_eq!(scheduler.step().ticks_fired, 1);
        clock.advance(Duration::from_secs(5));
        scheduler.step();
        assert_eq!(count.get(), 2);
        assert_eq!(sub.tick_count(), 2);
    }

    #[test]
    fn sub_millisecond_interval_rounds_up() {
        let (clock, scheduler) = setup();
        let (count, tick) = counter();
        let sub = scheduler.start(0.0005, tick);
        assert_eq!(sub.interval(), RefreshInterval::Every(Duration::from_millis(1)));
        assert_eq!(
            scheduler.next_deadline(),
            Some(clock.now().saturating_add(Duration::from_millis(1)))
        );

        for _ in 0..5 {
            scheduler.step();
        }
        assert_eq!(count.get(), 0);

        clock.advance(Duration::from_millis(1));
        scheduler.step();
        scheduler.step();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn fractional_millis_round_up() {
        let (_clock, scheduler) = setup();
        let sub = scheduler.start(Duration::from_micros(1_000_500), || {});
        assert_eq!(sub.interval(), RefreshInterval::Every(Duration::from_millis(1001)));
        sub.reconfigure(Duration::from_millis(250));
        assert_eq!(sub.interval(), RefreshInterval::Every(Duration::from_millis(250)));
    }

    #[test]
    fn late_step_fires_once_without_stacking() {
        let (clock, scheduler) = setup();
        let (count, tick) = counter();
        let _sub = scheduler.start(1.0, tick);
        clock.advance(Duration::from_secs(30));
        scheduler.step();
        assert_eq!(count.get(), 1);
        assert_eq!(
            scheduler.next_deadline(),
            Some(clock.now().saturating_add(Duration::from_secs(1)))
        );
        scheduler.step();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn disabled_never_fires() {
        let (clock, scheduler) = setup();
        let (count, tick) = counter();
        let sub = scheduler.start(0.0, tick);
        assert!(sub.is_active());
        assert_eq!(scheduler.active_timers(), 0);
        assert_eq!(scheduler.next_deadline(), None);
        clock.advance(Duration::from_secs(3600));
        scheduler.step();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn reconfigure_replaces_timer() {
        let (clock, scheduler) = setup();
        let (count, tick) = counter();
        let sub = scheduler.start(10.0, tick);
        clock.advance(Duration::from_secs(8));
        sub.reconfigure(3.0);
        assert_eq!(scheduler.active_timers(), 1);
        assert_eq!(sub.interval(), RefreshInterval::Every(Duration::from_secs(3)));

        // Old deadline (t+10) is gone; new one is t+8+3.
        clock.advance(Duration::from_secs(2));
        scheduler.step();
        assert_eq!(count.get(), 0);
        clock.advance(Duration::from_secs(1));
        scheduler.step();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn reconfigure_to_disabled_tears_down() {
        let (clock, scheduler) = setup();
        let (count, tick) = counter();
        let sub = scheduler.start(1.0, tick);
        sub.reconfigure(0.0);
        assert_eq!(scheduler.active_timers(), 0);
        assert!(sub.is_active());
        clock.advance(Duration::from_secs(5));
        scheduler.step();
        assert_eq!(count.get(), 0);

        sub.reconfigure(2.0);
        clock.advance(Duration::from_secs(2));
        scheduler.step();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn stop_is_idempotent() {
        let (_clock, scheduler) = setup();
        let sub = scheduler.start(1.0, || {});
        sub.stop();
        sub.stop();
        assert!(!sub.is_active());
        assert_eq!(scheduler.subscription_count(), 0);
    }

    #[test]
    fn reconfigure_after_stop_is_ignored() {
        let (clock, scheduler) = setup();
        let (count, tick) = counter();
        let sub = scheduler.start(1.0, tick);
        sub.stop();
        sub.reconfigure(1.0);
        assert_eq!(scheduler.active_timers(), 0);
        assert_eq!(sub.interval(), RefreshInterval::Disabled);
        clock.advance(Duration::from_secs(2));
        scheduler.step();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn drop_stops() {
        let (clock, scheduler) = setup();
        let (count, tick) = counter();
        {
            let _sub = scheduler.start(1.0, tick);
            assert_eq!(scheduler.active_timers(), 1);
        }
        assert_eq!(scheduler.subscription_count(), 0);
        clock.advance(Duration::from_secs(5));
        scheduler.step();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn stop_from_earlier_callback_cancels_later_tick_in_same_step() {
        let (clock, scheduler) = setup();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let v = Rc::clone(&victim);
        let _killer = scheduler.start(1.0, move || {
            if let Some(sub) = v.borrow_mut().take() {
                sub.stop();
            }
        });
        let (count, tick) = counter();
        *victim.borrow_mut() = Some(scheduler.start(1.0, tick));

        clock.advance(Duration::from_secs(1));
        let r = scheduler.step();
        assert_eq!(r.ticks_fired, 1);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn callback_may_stop_itself() {
        let (clock, scheduler) = setup();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let s = Rc::clone(&slot);
        let fired = Rc::new(Cell::new(0u32));
        let f = Rc::clone(&fired);
        *slot.borrow_mut() = Some(scheduler.start(1.0, move || {
            f.set(f.get() + 1);
            s.borrow_mut().take();
        }));

        clock.advance(Duration::from_secs(1));
        scheduler.step();
        clock.advance(Duration::from_secs(1));
        scheduler.step();
        assert_eq!(fired.get(), 1);
        assert_eq!(scheduler.subscription_count(), 0);
    }

    #[test]
    fn callback_may_start_new_subscription() {
        let (clock, scheduler) = setup();
        let spawned: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));
        let sp = Rc::clone(&spawned);
        let sched = scheduler.clone();
        let _parent = scheduler.start(1.0, move || {
            sp.borrow_mut().push(sched.start(1.0, || {}));
        });
        clock.advance(Duration::from_secs(1));
        scheduler.step();
        assert_eq!(spawned.borrow().len(), 1);
        assert_eq!(scheduler.active_timers(), 2);
    }

    #[test]
    fn next_deadline_is_earliest() {
        let (clock, scheduler) = setup();
        let start = clock.now();
        let _a = scheduler.start(10.0, || {});
        let _b = scheduler.start(2.0, || {});
        assert_eq!(
            scheduler.next_deadline(),
            Some(start.saturating_add(Duration::from_secs(2)))
        );
    }

    #[test]
    fn dropped_scheduler_makes_handles_inert() {
        let (_clock, scheduler) = setup();
        let sub = scheduler.start(1.0, || {});
        drop(scheduler);
        assert!(!sub.is_active());
        sub.stop();
        sub.reconfigure(5.0);
        assert_eq!(sub.tick_count(), 0);
    }
}
