//! Mission Control dashboard data layer.
//!
//! Widgets refresh independent JSON snapshots on their own intervals and
//! keep their last-known-good value when a fetch fails. The schedule and
//! widget state are plain synchronous types so any host can drive them;
//! the HTTP client and async poll loop are native-only.

pub mod focus;
pub mod poll;
pub mod types;

#[cfg(not(target_arch = "wasm32"))]
pub mod client;
#[cfg(not(target_arch = "wasm32"))]
pub mod runner;

pub use focus::{time_ago, time_ago_str, TodayFocus};
pub use poll::{
    ApplyOutcome, Clock, FetchTicket, ManualClock, PollSchedule, WasmPollSchedule, WidgetState,
};
pub use types::{Endpoint, Envelope, HttpMethod};

#[cfg(not(target_arch = "wasm32"))]
pub use client::{DashboardApiError, DashboardClient, PipelineOutcome};
#[cfg(not(target_arch = "wasm32"))]
pub use poll::SystemClock;
#[cfg(not(target_arch = "wasm32"))]
pub use runner::{poll_once, run_poller, SnapshotSource, TokioClock};
