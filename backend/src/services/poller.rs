//! Change-detection poller.
//!
//! Fetches the job source on a fixed interval and calls back only when the
//! snapshot signature changes. At most one fetch is in flight: when the next
//! tick arrives before the previous fetch finished, the old fetch is dropped
//! (which cancels it) and its result can never reach the callback. The
//! superseded fetch is reported as [`FetchError::Cancelled`].
//!
//! The callback is fallible. A signature is only remembered once the
//! callback accepted the snapshot, so a failed hand-off is retried on the
//! next tick even when the source has not changed.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, OptionFuture};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::signature::ChangeDetector;
use super::source::{FetchError, FetchResult, Fetcher};
use crate::error::{HeatmapError, HeatmapResult};
use crate::models::TimelineSnapshot;

/// Delivered to the change callback.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub snapshot: TimelineSnapshot,
    pub signature: String,
}

/// Callback invoked with every changed snapshot. An `Err` leaves the
/// snapshot uncommitted.
pub type OnChange = Arc<dyn Fn(ChangeEvent) -> HeatmapResult<()> + Send + Sync>;

/// What a single poll did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Changed { signature: String },
    Unchanged,
    Cancelled,
    Failed { message: String },
}

struct RunningPoll {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodic, single-flight poller over a [`Fetcher`].
pub struct Poller {
    fetcher: Arc<dyn Fetcher>,
    interval: Duration,
    detector: Arc<Mutex<ChangeDetector>>,
    last_outcome: Arc<Mutex<Option<PollOutcome>>>,
    running: Mutex<Option<RunningPoll>>,
}

impl Poller {
    pub fn new(fetcher: Arc<dyn Fetcher>, interval: Duration) -> HeatmapResult<Self> {
        if interval.is_zero() {
            return Err(HeatmapError::configuration("Poll interval must be greater than zero")
                .with_operation("create_poller"));
        }
        Ok(Self {
            fetcher,
            interval,
            detector: Arc::new(Mutex::new(ChangeDetector::new())),
            last_outcome: Arc::new(Mutex::new(None)),
            running: Mutex::new(None),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|run| !run.handle.is_finished())
    }

    pub fn last_signature(&self) -> Option<String> {
        self.detector.lock().last_signature().map(str::to_string)
    }

    /// Outcome of the most recent poll, background or [`Poller::poll_once`].
    pub fn last_outcome(&self) -> Option<PollOutcome> {
        self.last_outcome.lock().clone()
    }

    /// Start polling on a background task. The first fetch happens
    /// immediately. Returns `false` if the poller was already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&self, on_change: F) -> bool
    where
        F: Fn(ChangeEvent) -> HeatmapResult<()> + Send + Sync + 'static,
    {
        let mut running = self.running.lock();
        if running.as_ref().is_some_and(|run| !run.handle.is_finished()) {
            debug!("Poller already running; start ignored");
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.detector),
            Arc::clone(&self.last_outcome),
            self.interval,
            cancel.clone(),
            Arc::new(on_change),
        ));

        info!(
            source = %self.fetcher.describe(),
            interval_ms = self.interval.as_millis() as u64,
            "Poller started"
        );
        *running = Some(RunningPoll { cancel, handle });
        true
    }

    /// Stop the timer and abandon any in-flight fetch.
    ///
    /// Once this returns the callback will not be invoked again.
    pub async fn stop(&self) {
        let run = self.running.lock().take();
        let Some(run) = run else {
            return;
        };

        run.cancel.cancel();
        if let Err(e) = run.handle.await {
            if !e.is_cancelled() {
                warn!(error = %e, "Poller task ended abnormally");
            }
        }
        info!("Poller stopped");
    }

    /// Stop and forget the last signature, so the next poll always fires.
    pub async fn destroy(&self) {
        self.stop().await;
        self.detector.lock().reset();
    }

    /// Run a single fetch-and-compare cycle on the caller's task.
    pub async fn poll_once<F>(&self, on_change: F) -> PollOutcome
    where
        F: Fn(ChangeEvent) -> HeatmapResult<()>,
    {
        let result = self.fetcher.fetch().await;
        let outcome = apply_result(result, &self.detector, &on_change);
        *self.last_outcome.lock() = Some(outcome.clone());
        outcome
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(run) = self.running.get_mut().take() {
            run.cancel.cancel();
            run.handle.abort();
        }
    }
}

async fn run_loop(
    fetcher: Arc<dyn Fetcher>,
    detector: Arc<Mutex<ChangeDetector>>,
    last_outcome: Arc<Mutex<Option<PollOutcome>>>,
    interval: Duration,
    cancel: CancellationToken,
    on_change: OnChange,
) {
    let record = |outcome: PollOutcome| *last_outcome.lock() = Some(outcome);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut in_flight: Option<BoxFuture<'static, FetchResult<TimelineSnapshot>>> = None;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                if in_flight.take().is_some() {
                    record(apply_result(Err(FetchError::Cancelled), &detector, on_change.as_ref()));
                }
                break;
            }

            _ = ticker.tick() => {
                if in_flight.take().is_some() {
                    debug!("Previous fetch still running; superseded by new tick");
                    record(apply_result(Err(FetchError::Cancelled), &detector, on_change.as_ref()));
                }
                let fetcher = Arc::clone(&fetcher);
                in_flight = Some(Box::pin(async move { fetcher.fetch().await }));
            }

            Some(result) = OptionFuture::from(in_flight.as_mut()), if in_flight.is_some() => {
                in_flight = None;
                if cancel.is_cancelled() {
                    break;
                }
                record(apply_result(result, &detector, on_change.as_ref()));
            }
        }
    }

    debug!("Poll loop exited");
}

fn apply_result(
    result: FetchResult<TimelineSnapshot>,
    detector: &Mutex<ChangeDetector>,
    on_change: &dyn Fn(ChangeEvent) -> HeatmapResult<()>,
) -> PollOutcome {
    let snapshot = match result {
        Ok(snapshot) => snapshot,
        Err(e) if e.is_cancelled() => {
            debug!("Fetch cancelled");
            return PollOutcome::Cancelled;
        }
        Err(e) => {
            warn!(error = %e, "Fetch failed; will retry on next tick");
            return PollOutcome::Failed {
                message: e.to_string(),
            };
        }
    };

    let changed = detector.lock().changed_signature(&snapshot);
    let Some(signature) = changed else {
        debug!("Job timeline unchanged");
        return PollOutcome::Unchanged;
    };

    let jobs = snapshot.len();
    let event = ChangeEvent {
        snapshot,
        signature: signature.clone(),
    };
    match on_change(event) {
        Ok(()) => {
            detector.lock().commit(signature.clone());
            info!(jobs, signature = %signature, "Job timeline changed");
            PollOutcome::Changed { signature }
        }
        Err(e) => {
            warn!(error = %e, signature = %signature, "Change handler failed; snapshot stays pending");
            PollOutcome::Failed {
                message: e.to_string(),
            }
        }
    }
}
