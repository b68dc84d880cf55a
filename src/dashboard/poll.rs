//! Host-agnostic polling primitives.
//!
//! [`PollSchedule`] is an explicit start/stop handle driven by a [`Clock`],
//! so tests and the CLI can step it deterministically. [`WidgetState`] holds
//! one widget's last-known-good value with stale-while-revalidate semantics.

use std::cell::Cell;
use std::fmt::Display;
use std::time::Duration;

use wasm_bindgen::prelude::*;

/// Milliseconds since an arbitrary epoch.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Clock whose time is set by its owner: tests, replays, or a browser host
/// passing `performance.now()`.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        ManualClock {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by.as_millis() as u64);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Wall clock. Not available on wasm32, where `SystemTime::now` panics.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Recurring fetch schedule for one widget.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    interval_ms: u64,
    next_due_ms: Option<u64>,
    fired: u64,
}

impl PollSchedule {
    pub fn new(interval: Duration) -> Self {
        PollSchedule {
            interval_ms: (interval.as_millis() as u64).max(1),
            next_due_ms: None,
            fired: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Arm the schedule. The first fetch is due immediately.
    pub fn start(&mut self, now_ms: u64) {
        self.next_due_ms = Some(now_ms);
    }

    /// Disarm. Nothing is due until the next `start`.
    pub fn stop(&mut self) {
        self.next_due_ms = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due_ms.is_some()
    }

    pub fn due(&self, now_ms: u64) -> bool {
        self.next_due_ms.is_some_and(|due| now_ms >= due)
    }

    /// Record a fetch and schedule the next one a full interval later.
    pub fn mark_fired(&mut self, now_ms: u64) {
        if self.next_due_ms.is_some() {
            self.next_due_ms = Some(now_ms + self.interval_ms);
            self.fired += 1;
        }
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.next_due_ms
    }

    pub fn fire_count(&self) -> u64 {
        self.fired
    }

    /// Fire if due. Returns whether the caller should fetch now.
    pub fn poll(&mut self, clock: &dyn Clock) -> bool {
        let now = clock.now_ms();
        if self.due(now) {
            self.mark_fired(now);
            true
        } else {
            false
        }
    }
}

fn host_ms(ms: f64) -> u64 {
    if ms.is_finite() && ms > 0.0 {
        ms as u64
    } else {
        0
    }
}

/// [`PollSchedule`] for browser hosts. JS owns the timer and passes its own
/// millisecond clock into every call.
#[wasm_bindgen]
pub struct WasmPollSchedule {
    schedule: PollSchedule,
    clock: ManualClock,
}

#[wasm_bindgen]
impl WasmPollSchedule {
    #[wasm_bindgen(constructor)]
    pub fn new(interval_ms: f64) -> WasmPollSchedule {
        WasmPollSchedule {
            schedule: PollSchedule::new(Duration::from_millis(host_ms(interval_ms))),
            clock: ManualClock::default(),
        }
    }

    pub fn start(&mut self, now_ms: f64) {
        self.clock.set(host_ms(now_ms));
        self.schedule.start(self.clock.now_ms());
    }

    pub fn stop(&mut self) {
        self.schedule.stop();
    }

    pub fn is_running(&self) -> bool {
        self.schedule.is_running()
    }

    /// Whether the host should fetch now. Firing moves the next due time one
    /// interval ahead.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        self.clock.set(host_ms(now_ms));
        self.schedule.poll(&self.clock)
    }

    /// Milliseconds until the next fetch is due, or -1 when stopped.
    pub fn next_delay_ms(&self, now_ms: f64) -> f64 {
        match self.schedule.next_due_ms() {
            Some(due) => due.saturating_sub(host_ms(now_ms)) as f64,
            None => -1.0,
        }
    }

    pub fn fire_count(&self) -> f64 {
        self.schedule.fire_count() as f64
    }
}

/// Proof that a fetch was started for a particular attachment of the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

/// Outcome of handing a fetch result to [`WidgetState::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Updated,
    /// Success without a payload; previous value kept.
    Empty,
    /// Fetch failed; previous value kept.
    Failed,
    /// Response belonged to a detached widget and was dropped.
    Discarded,
}

/// One widget's display state.
#[derive(Debug, Clone)]
pub struct WidgetState<T> {
    name: &'static str,
    value: Option<T>,
    loading: bool,
    updated_at_ms: Option<u64>,
    generation: u64,
}

impl<T> WidgetState<T> {
    pub fn new(name: &'static str) -> Self {
        WidgetState {
            name,
            value: None,
            loading: false,
            updated_at_ms: None,
            generation: 0,
        }
    }

    /// Seed with a placeholder value shown until the first successful fetch.
    pub fn with_initial(name: &'static str, initial: T) -> Self {
        WidgetState {
            value: Some(initial),
            ..WidgetState::new(name)
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn updated_at_ms(&self) -> Option<u64> {
        self.updated_at_ms
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.loading = true;
        FetchTicket {
            generation: self.generation,
        }
    }

    /// Apply a fetch result. Only a successful fetch with a payload replaces
    /// the value; the loading flag is cleared on every path.
    pub fn apply<E: Display>(
        &mut self,
        ticket: FetchTicket,
        result: Result<Option<T>, E>,
        now_ms: u64,
    ) -> ApplyOutcome {
        if ticket.generation != self.generation {
            tracing::debug!(widget = self.name, "Dropping response for detached widget");
            return ApplyOutcome::Discarded;
        }
        self.loading = false;
        match result {
            Ok(Some(value)) => {
                self.value = Some(value);
                self.updated_at_ms = Some(now_ms);
                ApplyOutcome::Updated
            }
            Ok(None) => ApplyOutcome::Empty,
            Err(e) => {
                tracing::error!(widget = self.name, error = %e, "Failed to fetch widget data");
                ApplyOutcome::Failed
            }
        }
    }

    /// Tear down: in-flight responses started before this call are ignored.
    pub fn detach(&mut self) {
        self.generation += 1;
        self.loading = false;
    }

    /// No successful fetch within `max_age`.
    pub fn is_stale(&self, now_ms: u64, max_age: Duration) -> bool {
        match self.updated_at_ms {
            Some(at) => now_ms.saturating_sub(at) > max_age.as_millis() as u64,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FIVE_MIN: Duration = Duration::from_secs(300);

    #[test]
    fn first_fetch_is_immediate_then_every_interval() {
        let clock = ManualClock::new(1_000);
        let mut schedule = PollSchedule::new(FIVE_MIN);
        assert!(!schedule.poll(&clock));

        schedule.start(clock.now_ms());
        assert!(schedule.poll(&clock));
        assert!(!schedule.poll(&clock));

        clock.advance(Duration::from_secs(299));
        assert!(!schedule.poll(&clock));
        clock.advance(Duration::from_secs(1));
        assert!(schedule.poll(&clock));
        assert_eq!(schedule.fire_count(), 2);
    }

    #[test]
    fn stop_prevents_further_fetches() {
        let clock = ManualClock::new(0);
        let mut schedule = PollSchedule::new(FIVE_MIN);
        schedule.start(0);
        assert!(schedule.poll(&clock));
        schedule.stop();
        assert!(!schedule.is_running());

        clock.advance(Duration::from_secs(3_600));
        assert!(!schedule.poll(&clock));
        schedule.mark_fired(clock.now_ms());
        assert_eq!(schedule.fire_count(), 1);
        assert_eq!(schedule.next_due_ms(), None);
    }

    #[test]
    fn host_driven_schedule() {
        let mut schedule = WasmPollSchedule::new(30_000.0);
        assert!(!schedule.poll(0.0));
        assert_eq!(schedule.next_delay_ms(0.0), -1.0);

        schedule.start(1_000.5);
        assert!(schedule.is_running());
        assert!(schedule.poll(1_000.5));
        assert!(!schedule.poll(20_000.0));
        assert_eq!(schedule.next_delay_ms(20_000.0), 11_000.0);
        assert!(schedule.poll(31_000.0));
        assert_eq!(schedule.fire_count(), 2.0);

        // Non-finite or negative host times read as zero.
        assert!(!schedule.poll(f64::NAN));
        schedule.stop();
        assert!(!schedule.poll(1e9));
        assert_eq!(schedule.fire_count(), 2.0);
    }

    #[test]
    fn failed_fetch_keeps_previous_value() {
        let mut widget = WidgetState::new("system-metrics");
        let ticket = widget.begin_fetch();
        assert!(widget.is_loading());
        assert_eq!(
            widget.apply::<String>(ticket, Ok(Some(7u32)), 10),
            ApplyOutcome::Updated
        );

        let ticket = widget.begin_fetch();
        let outcome = widget.apply(ticket, Err("connection refused"), 20);
        assert_eq!(outcome, ApplyOutcome::Failed);
        assert_eq!(widget.value(), Some(&7));
        assert_eq!(widget.updated_at_ms(), Some(10));
        assert!(!widget.is_loading());
    }

    #[test]
    fn empty_success_keeps_placeholder() {
        let mut widget = WidgetState::with_initial("memories", vec!["seed"]);
        let ticket = widget.begin_fetch();
        assert_eq!(
            widget.apply::<String>(ticket, Ok(None), 5),
            ApplyOutcome::Empty
        );
        assert_eq!(widget.value(), Some(&vec!["seed"]));
        assert!(!widget.is_loading());
    }

    #[test]
    fn late_response_after_detach_is_discarded() {
        let mut widget = WidgetState::new("nio-status");
        let ticket = widget.begin_fetch();
        widget.detach();
        assert_eq!(
            widget.apply::<String>(ticket, Ok(Some(1)), 5),
            ApplyOutcome::Discarded
        );
        assert_eq!(widget.value(), None);

        let fresh = widget.begin_fetch();
        assert_eq!(
            widget.apply::<String>(fresh, Ok(Some(2)), 6),
            ApplyOutcome::Updated
        );
    }

    #[test]
    fn staleness() {
        let mut widget = WidgetState::new("session");
        assert!(widget.is_stale(0, FIVE_MIN));
        let ticket = widget.begin_fetch();
        widget.apply::<String>(ticket, Ok(Some(())), 1_000);
        assert!(!widget.is_stale(301_000, FIVE_MIN));
        assert!(widget.is_stale(301_001, FIVE_MIN));
    }

    proptest! {
        /// Any failure leaves the displayed value exactly as before the fetch.
        #[test]
        fn failure_never_blanks(seed in any::<i64>(), message in ".*") {
            let mut widget = WidgetState::new("prop");
            let t = widget.begin_fetch();
            widget.apply::<String>(t, Ok(Some(seed)), 1);
            let before = widget.value().copied();

            let t = widget.begin_fetch();
            widget.apply(t, Err(message), 2);
            prop_assert_eq!(widget.value().copied(), before);
            prop_assert!(!widget.is_loading());
        }

        /// A running schedule fires exactly once per elapsed interval when stepped at the interval.
        #[test]
        fn fires_once_per_interval(interval_s in 1u64..3_600, steps in 1usize..50) {
            let clock = ManualClock::new(0);
            let mut schedule = PollSchedule::new(Duration::from_secs(interval_s));
            schedule.start(0);
            for _ in 0..steps {
                prop_assert!(schedule.poll(&clock));
                prop_assert!(!schedule.poll(&clock));
                clock.advance(Duration::from_secs(interval_s));
            }
            prop_assert_eq!(schedule.fire_count(), steps as u64);
        }
    }
}
