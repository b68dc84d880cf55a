//! Async poll loop for native hosts.
//!
//! Drives one [`WidgetState`] from a [`SnapshotSource`] on the cadence of a
//! [`PollSchedule`]. The loop sleeps until the schedule's next due time as
//! read from the injected [`Clock`], and runs until `cancel` is triggered; an
//! in-flight fetch is abandoned on cancellation and its response never
//! reaches the widget.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::poll::{ApplyOutcome, Clock, PollSchedule, WidgetState};

/// Monotonic clock backed by the tokio timer, counting from construction.
/// Follows paused and advanced time in tokio tests.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        TokioClock {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        TokioClock::new()
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Something that can produce one widget snapshot.
pub trait SnapshotSource: Send + Sync {
    type Item: Send;
    type Error: Display + Send;

    fn fetch(&self) -> impl Future<Output = Result<Option<Self::Item>, Self::Error>> + Send;
}

impl<F, Fut, T, E> SnapshotSource for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<T>, E>> + Send,
    T: Send,
    E: Display + Send,
{
    type Item = T;
    type Error = E;

    fn fetch(&self) -> impl Future<Output = Result<Option<T>, E>> + Send {
        self()
    }
}

/// Fetch once and apply the result, stamped with `clock`.
pub async fn poll_once<S, C>(
    source: &S,
    widget: &mut WidgetState<S::Item>,
    clock: &C,
) -> ApplyOutcome
where
    S: SnapshotSource,
    C: Clock,
{
    let ticket = widget.begin_fetch();
    let result = source.fetch().await;
    widget.apply(ticket, result, clock.now_ms())
}

/// Poll `source` whenever `schedule` is due until cancelled, publishing each
/// accepted value on `updates`. The schedule is started on entry, so the
/// first fetch happens immediately. Returns the widget so callers can inspect
/// final state.
pub async fn run_poller<S, C>(
    source: S,
    mut widget: WidgetState<S::Item>,
    mut schedule: PollSchedule,
    clock: C,
    cancel: CancellationToken,
    updates: watch::Sender<Option<S::Item>>,
) -> WidgetState<S::Item>
where
    S: SnapshotSource,
    S::Item: Clone,
    C: Clock + Send,
{
    tracing::info!(
        widget = widget.name(),
        interval_secs = schedule.interval().as_secs(),
        "Widget poller started"
    );

    schedule.start(clock.now_ms());

    loop {
        if schedule.poll(&clock) {
            let ticket = widget.begin_fetch();
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    break;
                }
                result = source.fetch() => result,
            };
            match widget.apply(ticket, result, clock.now_ms()) {
                ApplyOutcome::Updated => {
                    tracing::debug!(widget = widget.name(), "Widget refreshed");
                    updates.send_replace(widget.value().cloned());
                }
                ApplyOutcome::Empty => {
                    tracing::debug!(widget = widget.name(), "No data in response, keeping previous value");
                }
                ApplyOutcome::Failed | ApplyOutcome::Discarded => {}
            }
        }

        let now = clock.now_ms();
        let wait = schedule
            .next_due_ms()
            .map_or(schedule.interval(), |due| {
                Duration::from_millis(due.saturating_sub(now))
            })
            .max(Duration::from_millis(1));

        tokio::select! {
            _ = cancel.cancelled() => {
                break;
            }
            _ = tokio::time::sleep(wait) => {}
        }
    }

    schedule.stop();
    widget.detach();
    tracing::info!(
        widget = widget.name(),
        fetches = schedule.fire_count(),
        "Widget poller stopping"
    );
    widget
}
