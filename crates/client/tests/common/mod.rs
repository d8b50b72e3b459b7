#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use scout_client::api::{ApiError, GenerateRequest, GenerateResponse, HealthStatus, ResearchApi};
use scout_client::poller::PollerConfig;
use scout_core::report::{Report, ReportStatus};

/// Short cadence so tests finish quickly.
pub const TEST_INTERVAL: Duration = Duration::from_millis(10);

pub fn test_poller_config() -> PollerConfig {
    PollerConfig {
        interval: TEST_INTERVAL,
        max_duration: None,
    }
}

/// Build a report with the given status and progress.
pub fn report(id: &str, status: ReportStatus, progress: i32) -> Report {
    Report {
        id: id.to_string(),
        status,
        progress,
        created_at: Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap(),
        topic: "Solid-state batteries".to_string(),
        research_type: "technology_review".to_string(),
        result: None,
        error_message: None,
    }
}

pub fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        body: "unavailable".to_string(),
    }
}

/// In-memory [`ResearchApi`] that replays a scripted sequence of status
/// responses and counts every call.
///
/// Once the script is exhausted, status requests keep returning a
/// `processing` report so an over-polling bug shows up in the counters.
pub struct ScriptedApi {
    report_id: String,
    statuses: Mutex<VecDeque<Result<Report, ApiError>>>,
    reports: Mutex<Vec<Report>>,
    healthy: AtomicBool,
    pub generate_requests: Mutex<Vec<GenerateRequest>>,
    pub status_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new(report_id: &str) -> Self {
        Self {
            report_id: report_id.to_string(),
            statuses: Mutex::new(VecDeque::new()),
            reports: Mutex::new(Vec::new()),
            healthy: AtomicBool::new(true),
            generate_requests: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_statuses(self, statuses: Vec<Result<Report, ApiError>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn with_reports(self, reports: Vec<Report>) -> Self {
        *self.reports.lock().unwrap() = reports;
        self
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl ResearchApi for ScriptedApi {
    async fn generate_report(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, ApiError> {
        self.generate_requests.lock().unwrap().push(request.clone());
        Ok(GenerateResponse {
            report_id: self.report_id.clone(),
            status: Some(ReportStatus::Pending),
            extra: Default::default(),
        })
    }

    async fn get_report_status(&self, report_id: &str) -> Result<Report, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.statuses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(report(report_id, ReportStatus::Processing, 50)))
    }

    async fn get_reports(&self) -> Result<Vec<Report>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reports.lock().unwrap().clone())
    }

    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(HealthStatus {
                status: Some("healthy".to_string()),
                extra: Default::default(),
            })
        } else {
            Err(unavailable())
        }
    }
}
