//! Headless dashboard model.
//!
//! Tracks the research server's connectivity, caches the report list, and
//! runs at most one [`ReportPoller`] per report id. Failures are turned into
//! a single user-facing message (`last_error`) instead of propagating.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use scout_core::report::{Report, ReportStatus};
use tokio::sync::{watch, RwLock};

use crate::api::{ApiError, GenerateRequest, ResearchApi};
use crate::poller::{
    wait_for_outcome, PollHandle, PollOutcome, PollSnapshot, PollerConfig, ReportPoller,
};

/// Message recorded when the research server cannot be reached.
pub const OFFLINE_MSG: &str = "Unable to reach the research server";

/// Connectivity indicator shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// No request has completed yet.
    Unknown,
    Online,
    Offline,
}

/// Errors surfaced by dashboard actions.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug)]
struct DashboardState {
    connectivity: Connectivity,
    reports: Vec<Report>,
    last_error: Option<String>,
}

/// Dashboard state plus the registry of running pollers.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Dashboard {
    api: Arc<dyn ResearchApi>,
    poller_config: PollerConfig,
    state: Arc<RwLock<DashboardState>>,
    pollers: Arc<RwLock<HashMap<String, PollHandle>>>,
    /// Outcomes of pollers pruned from `pollers`. Lock after `pollers`.
    finished: Arc<RwLock<HashMap<String, PollOutcome>>>,
}

impl Dashboard {
    pub fn new(api: Arc<dyn ResearchApi>, poller_config: PollerConfig) -> Self {
        Self {
            api,
            poller_config,
            state: Arc::new(RwLock::new(DashboardState {
                connectivity: Connectivity::Unknown,
                reports: Vec::new(),
                last_error: None,
            })),
            pollers: Arc::new(RwLock::new(HashMap::new())),
            finished: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    // ---- accessors ----

    pub async fn connectivity(&self) -> Connectivity {
        self.state.read().await.connectivity
    }

    /// The cached report list from the last successful refresh.
    pub async fn reports(&self) -> Vec<Report> {
        self.state.read().await.reports.clone()
    }

    /// Latest known copy of a report: the poller's view if one exists,
    /// otherwise the cached list.
    pub async fn report(&self, report_id: &str) -> Option<Report> {
        let polled = self
            .pollers
            .read()
            .await
            .get(report_id)
            .and_then(|h| h.snapshot().report);
        if polled.is_some() {
            return polled;
        }
        self.state
            .read()
            .await
            .reports
            .iter()
            .find(|r| r.id == report_id)
            .cloned()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    // ---- actions ----

    /// Probe the research server and update the connectivity indicator.
    ///
    /// Never fails: an unreachable or unhealthy server yields `Offline`.
    pub async fn check_health(&self) -> Connectivity {
        match self.api.health_check().await {
            Ok(_) => {
                mark_online(&self.state).await;
                Connectivity::Online
            }
            Err(e) => {
                tracing::warn!(error = %e, "Research server health check failed");
                mark_offline(&self.state).await;
                Connectivity::Offline
            }
        }
    }

    /// Submit a research request and start polling it.
    ///
    /// The new report is listed as pending straight away; the next list
    /// refresh replaces that placeholder. Returns the server's report id.
    pub async fn submit(
        &self,
        topic: &str,
        research_type: &str,
        user_id: Option<&str>,
    ) -> Result<String, DashboardError> {
        let topic = topic.trim();
        if topic.is_empty() {
            let msg = "Please enter a research topic".to_string();
            self.state.write().await.last_error = Some(msg.clone());
            return Err(DashboardError::Validation(msg));
        }

        let request = GenerateRequest {
            topic: topic.to_string(),
            research_type: research_type.to_string(),
            user_id: user_id.map(str::to_string),
        };

        let response = match self.api.generate_report(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Generate request failed");
                record_failure(&self.state, &e).await;
                return Err(e.into());
            }
        };

        {
            let mut state = self.state.write().await;
            state.connectivity = Connectivity::Online;
            state.last_error = None;
            if !state.reports.iter().any(|r| r.id == response.report_id) {
                state.reports.insert(
                    0,
                    Report {
                        id: response.report_id.clone(),
                        status: response.status.unwrap_or(ReportStatus::Pending),
                        progress: 0,
                        created_at: Utc::now(),
                        topic: request.topic,
                        research_type: request.research_type,
                        result: None,
                        error_message: None,
                    },
                );
            }
        }

        tracing::info!(report_id = %response.report_id, "Research report queued");
        self.watch(&response.report_id).await;
        Ok(response.report_id)
    }

    /// Start polling an existing report, or re-use the poller already
    /// running for it.
    pub async fn watch(&self, report_id: &str) -> watch::Receiver<PollSnapshot> {
        let mut pollers = self.pollers.write().await;
        let done: Vec<String> = pollers
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        let mut finished = self.finished.write().await;
        for id in done {
            if let Some(handle) = pollers.remove(&id) {
                let outcome = handle.snapshot().outcome.unwrap_or(PollOutcome::Cancelled);
                finished.insert(id, outcome);
            }
        }

        if let Some(existing) = pollers.get(report_id) {
            tracing::debug!(report_id, "Re-using running poller");
            return existing.subscribe();
        }
        finished.remove(report_id);
        drop(finished);

        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        let handle = ReportPoller::new(Arc::clone(&self.api), report_id, self.poller_config)
            .spawn_with(move |outcome| async move {
                apply_outcome(api.as_ref(), &state, &outcome).await;
            });

        let rx = handle.subscribe();
        pollers.insert(report_id.to_string(), handle);
        rx
    }

    /// Replace the cached report list with the server's current one.
    pub async fn refresh_reports(&self) -> Result<Vec<Report>, ApiError> {
        refresh_into(self.api.as_ref(), &self.state).await
    }

    /// Stop polling a report. Returns `false` if no poller was running.
    pub async fn cancel(&self, report_id: &str) -> bool {
        match self.pollers.read().await.get(report_id) {
            Some(handle) if !handle.is_finished() => {
                handle.cancel();
                true
            }
            _ => false,
        }
    }

    /// Wait for the report's poller to finish.
    ///
    /// A poller that already finished yields its recorded outcome. Returns
    /// `None` if the report was never watched.
    pub async fn wait(&self, report_id: &str) -> Option<PollOutcome> {
        let pollers = self.pollers.read().await;
        if let Some(handle) = pollers.get(report_id) {
            let rx = handle.subscribe();
            drop(pollers);
            return Some(wait_for_outcome(rx).await);
        }
        let outcome = self.finished.read().await.get(report_id).cloned();
        outcome
    }

    /// Cancel every running poller.
    pub async fn shutdown(&self) {
        let pollers = self.pollers.read().await;
        let running = pollers.values().filter(|h| !h.is_finished()).count();
        for handle in pollers.values() {
            handle.cancel();
        }
        tracing::info!(running, "Dashboard pollers cancelled");
    }
}

// ---------------------------------------------------------------------------
// Shared state updates (also run from poller completion hooks)
// ---------------------------------------------------------------------------

async fn mark_online(state: &RwLock<DashboardState>) {
    state.write().await.connectivity = Connectivity::Online;
}

async fn mark_offline(state: &RwLock<DashboardState>) {
    let mut state = state.write().await;
    state.connectivity = Connectivity::Offline;
    state.last_error = Some(OFFLINE_MSG.to_string());
}

/// Record an API failure. Request-level failures mean the server is
/// unreachable; a status error means it answered, so stay online.
async fn record_failure(state: &RwLock<DashboardState>, err: &ApiError) {
    match err {
        ApiError::Request(_) | ApiError::InvalidUrl(_) => mark_offline(state).await,
        ApiError::Status { .. } => {
            let mut state = state.write().await;
            state.connectivity = Connectivity::Online;
            state.last_error = Some(err.to_string());
        }
    }
}

async fn refresh_into(
    api: &dyn ResearchApi,
    state: &RwLock<DashboardState>,
) -> Result<Vec<Report>, ApiError> {
    match api.get_reports().await {
        Ok(reports) => {
            let mut state = state.write().await;
            state.connectivity = Connectivity::Online;
            state.reports = reports.clone();
            Ok(reports)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Report list refresh failed");
            record_failure(state, &e).await;
            Err(e)
        }
    }
}

async fn apply_outcome(
    api: &dyn ResearchApi,
    state: &RwLock<DashboardState>,
    outcome: &PollOutcome,
) {
    match outcome {
        PollOutcome::Completed(_) | PollOutcome::Failed(_) => {
            if let PollOutcome::Failed(report) = outcome {
                state.write().await.last_error = Some(
                    report
                        .error_message
                        .clone()
                        .unwrap_or_else(|| "Report generation failed".to_string()),
                );
            }
            // Errors are already recorded in `last_error`.
            let _ = refresh_into(api, state).await;
        }
        PollOutcome::Transport(_) => mark_offline(state).await,
        PollOutcome::TimedOut(elapsed) => {
            state.write().await.last_error = Some(format!(
                "Report did not finish within {} seconds",
                elapsed.as_secs()
            ));
        }
        PollOutcome::Cancelled => {}
    }
}
