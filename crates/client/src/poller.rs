//! Fixed-cadence status poller for a single research report.
//!
//! After a successful generate call the poller requests the report's status
//! once per interval until the server reports `completed` or `error`, a
//! request fails, the optional deadline passes, or the poller is cancelled.
//! At most one status request is in flight per poller, and no request is
//! issued after the terminal observation.
//!
//! Progress is published through a [`watch`] channel of [`PollSnapshot`]s.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use scout_core::report::{Report, ReportStatus};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::ResearchApi;
use crate::config::{ClientConfig, DEFAULT_POLL_INTERVAL};

/// Lifecycle state of a poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Completed,
    Error,
    Cancelled,
}

impl PollState {
    pub fn is_finished(self) -> bool {
        self != Self::Polling
    }
}

/// How a poller finished.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The server reported `completed`.
    Completed(Report),
    /// The server reported `error`.
    Failed(Report),
    /// A status request failed; polling stopped without retrying.
    Transport(String),
    /// The configured maximum duration elapsed.
    TimedOut(Duration),
    /// The poller was cancelled.
    Cancelled,
}

impl PollOutcome {
    pub fn state(&self) -> PollState {
        match self {
            Self::Completed(_) => PollState::Completed,
            Self::Failed(_) | Self::Transport(_) | Self::TimedOut(_) => PollState::Error,
            Self::Cancelled => PollState::Cancelled,
        }
    }

    /// The final report, when the server provided one.
    pub fn report(&self) -> Option<&Report> {
        match self {
            Self::Completed(report) | Self::Failed(report) => Some(report),
            _ => None,
        }
    }
}

/// Point-in-time view of a poller, published after every status request.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSnapshot {
    pub report_id: String,
    pub state: PollState,
    /// Latest report fetched, if any request has succeeded yet.
    pub report: Option<Report>,
    /// Number of status requests issued so far.
    pub requests: u32,
    /// Set once the poller has finished and any completion hook has run.
    pub outcome: Option<PollOutcome>,
}

impl PollSnapshot {
    fn new(report_id: &str) -> Self {
        Self {
            report_id: report_id.to_string(),
            state: PollState::Polling,
            report: None,
            requests: 0,
            outcome: None,
        }
    }
}

/// Poller timing parameters.
#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    /// Delay before the first request and between subsequent requests.
    pub interval: Duration,
    /// Stop with [`PollOutcome::TimedOut`] after this long.
    pub max_duration: Option<Duration>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_duration: None,
        }
    }
}

impl From<&ClientConfig> for PollerConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            interval: config.poll_interval,
            max_duration: config.poll_max_duration,
        }
    }
}

/// Polls one report until it reaches a terminal state.
pub struct ReportPoller {
    api: Arc<dyn ResearchApi>,
    report_id: String,
    config: PollerConfig,
}

impl ReportPoller {
    pub fn new(
        api: Arc<dyn ResearchApi>,
        report_id: impl Into<String>,
        config: PollerConfig,
    ) -> Self {
        Self {
            api,
            report_id: report_id.into(),
            config,
        }
    }

    pub fn report_id(&self) -> &str {
        &self.report_id
    }

    /// Drive the poll loop on the current task.
    ///
    /// Non-terminal observations are published to `updates`; the terminal
    /// outcome is returned and left for the caller to publish.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        updates: &watch::Sender<PollSnapshot>,
    ) -> PollOutcome {
        let started = Instant::now();
        let deadline = self.config.max_duration.map(|max| started + max);
        let mut ticker =
            tokio::time::interval_at(started + self.config.interval, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_status: Option<ReportStatus> = None;

        tracing::debug!(
            report_id = %self.report_id,
            interval_ms = self.config.interval.as_millis() as u64,
            "Polling started",
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = sleep_until_deadline(deadline), if deadline.is_some() => {
                    return self.timed_out(started);
                }
                _ = ticker.tick() => {}
            }

            updates.send_modify(|s| s.requests += 1);

            // The deadline also bounds a request that never answers.
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = sleep_until_deadline(deadline), if deadline.is_some() => {
                    return self.timed_out(started);
                }
                result = self.api.get_report_status(&self.report_id) => result,
            };

            let report = match result {
                Ok(report) => report,
                Err(e) => {
                    tracing::warn!(report_id = %self.report_id, error = %e, "Status request failed");
                    return PollOutcome::Transport(e.to_string());
                }
            };

            if let Some(previous) = last_status {
                if !previous.can_advance_to(report.status) {
                    tracing::warn!(
                        report_id = %self.report_id,
                        from = %previous,
                        to = %report.status,
                        "Report status moved backwards",
                    );
                }
            }
            last_status = Some(report.status);

            match report.status {
                ReportStatus::Completed => return PollOutcome::Completed(report),
                ReportStatus::Error => return PollOutcome::Failed(report),
                ReportStatus::Pending | ReportStatus::Processing => {
                    tracing::debug!(
                        report_id = %self.report_id,
                        status = %report.status,
                        progress = report.progress,
                        "Report in progress",
                    );
                    updates.send_modify(|s| s.report = Some(report));
                }
            }
        }
    }

    fn timed_out(&self, started: Instant) -> PollOutcome {
        let elapsed = started.elapsed();
        tracing::warn!(report_id = %self.report_id, ?elapsed, "Polling timed out");
        PollOutcome::TimedOut(elapsed)
    }

    /// Spawn the poll loop as a background task.
    pub fn spawn(self) -> PollHandle {
        self.spawn_with(|_| async {})
    }

    /// Spawn the poll loop, running `on_finish` with the outcome before the
    /// final snapshot is published. Waiters therefore observe the outcome
    /// only after the hook has completed.
    pub fn spawn_with<F, Fut>(self, on_finish: F) -> PollHandle
    where
        F: FnOnce(PollOutcome) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let (tx, rx) = watch::channel(PollSnapshot::new(&self.report_id));
        let report_id = self.report_id.clone();

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let outcome = self.run(&task_cancel, &tx).await;

            tracing::info!(
                report_id = %self.report_id,
                state = ?outcome.state(),
                "Polling finished",
            );

            on_finish(outcome.clone()).await;

            tx.send_modify(|s| {
                s.state = outcome.state();
                if let Some(report) = outcome.report() {
                    s.report = Some(report.clone());
                }
                s.outcome = Some(outcome.clone());
            });
            outcome
        });

        PollHandle {
            report_id,
            cancel,
            updates: rx,
            task,
        }
    }
}

/// Owner-side handle to a spawned poller.
///
/// Dropping the handle cancels the poller.
#[derive(Debug)]
pub struct PollHandle {
    report_id: String,
    cancel: CancellationToken,
    updates: watch::Receiver<PollSnapshot>,
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    pub fn report_id(&self) -> &str {
        &self.report_id
    }

    /// Request cancellation. Has no effect once the poller has finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> PollSnapshot {
        self.updates.borrow().clone()
    }

    /// Whether the final outcome has been published.
    pub fn is_finished(&self) -> bool {
        self.updates.borrow().outcome.is_some() || self.task.is_finished()
    }

    /// A receiver for subsequent snapshots.
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.updates.clone()
    }

    /// Wait for the poller to finish and return its outcome.
    pub async fn wait(&self) -> PollOutcome {
        wait_for_outcome(self.subscribe()).await
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Resolves at `deadline`; never resolves when there is none.
async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Wait on a snapshot receiver until the poller publishes its outcome.
///
/// A poller task that ended without publishing (it panicked) is reported
/// as cancelled.
pub async fn wait_for_outcome(mut updates: watch::Receiver<PollSnapshot>) -> PollOutcome {
    let outcome = match updates.wait_for(|s| s.outcome.is_some()).await {
        Ok(snapshot) => snapshot.outcome.clone().unwrap_or(PollOutcome::Cancelled),
        Err(_) => PollOutcome::Cancelled,
    };
    outcome
}
