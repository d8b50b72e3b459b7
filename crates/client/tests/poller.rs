//! Behaviour of the report status poller against a scripted research API.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use common::{report, test_poller_config, unavailable, ScriptedApi, TEST_INTERVAL};
use scout_client::api::{ApiError, GenerateRequest, GenerateResponse, HealthStatus, ResearchApi};
use scout_client::poller::{PollOutcome, PollState, PollerConfig, ReportPoller};
use scout_core::report::{Report, ReportStatus};

/// Upper bound for any single test wait.
const DEADLINE: Duration = Duration::from_secs(5);

fn poller(api: &Arc<ScriptedApi>, config: PollerConfig) -> ReportPoller {
    let api: Arc<dyn ResearchApi> = api.clone();
    ReportPoller::new(api, "R1", config)
}

#[tokio::test]
async fn polls_until_completed_then_stops() {
    let api = ScriptedApi::new("R1")
        .with_statuses(vec![
            Ok(report("R1", ReportStatus::Pending, 0)),
            Ok(report("R1", ReportStatus::Processing, 40)),
            Ok(report("R1", ReportStatus::Completed, 100)),
        ])
        .into_shared();

    let handle = poller(&api, test_poller_config()).spawn();
    let outcome = tokio::time::timeout(DEADLINE, handle.wait())
        .await
        .expect("poller should finish");

    assert_matches!(&outcome, PollOutcome::Completed(r) if r.progress == 100);
    assert_eq!(api.status_calls(), 3);

    // No further requests after the terminal response.
    tokio::time::sleep(TEST_INTERVAL * 10).await;
    assert_eq!(api.status_calls(), 3);

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.state, PollState::Completed);
    assert_eq!(snapshot.requests, 3);
}

#[tokio::test]
async fn error_status_is_terminal() {
    let mut failed = report("R1", ReportStatus::Error, 60);
    failed.error_message = Some("source fetch failed".to_string());

    let api = ScriptedApi::new("R1")
        .with_statuses(vec![Ok(report("R1", ReportStatus::Processing, 20)), Ok(failed)])
        .into_shared();

    let handle = poller(&api, test_poller_config()).spawn();
    let outcome = tokio::time::timeout(DEADLINE, handle.wait()).await.unwrap();

    assert_matches!(&outcome, PollOutcome::Failed(r) if r.error_message.as_deref() == Some("source fetch failed"));
    assert_eq!(outcome.state(), PollState::Error);

    tokio::time::sleep(TEST_INTERVAL * 10).await;
    assert_eq!(api.status_calls(), 2);
}

#[tokio::test]
async fn transport_failure_stops_without_retry() {
    let api = ScriptedApi::new("R1")
        .with_statuses(vec![Err(unavailable())])
        .into_shared();

    let handle = poller(&api, test_poller_config()).spawn();
    let outcome = tokio::time::timeout(DEADLINE, handle.wait()).await.unwrap();

    assert_matches!(&outcome, PollOutcome::Transport(msg) if msg.contains("503"));
    assert_eq!(outcome.state(), PollState::Error);

    tokio::time::sleep(TEST_INTERVAL * 10).await;
    assert_eq!(api.status_calls(), 1);
}

#[tokio::test]
async fn cancellation_stops_polling() {
    // Script never reaches a terminal status.
    let api = ScriptedApi::new("R1").into_shared();

    let handle = poller(&api, test_poller_config()).spawn();
    tokio::time::sleep(TEST_INTERVAL * 5).await;
    handle.cancel();

    let outcome = tokio::time::timeout(DEADLINE, handle.wait()).await.unwrap();
    assert_eq!(outcome, PollOutcome::Cancelled);

    let calls = api.status_calls();
    tokio::time::sleep(TEST_INTERVAL * 10).await;
    assert_eq!(api.status_calls(), calls);
}

#[tokio::test]
async fn dropping_the_handle_cancels_the_poller() {
    let api = ScriptedApi::new("R1").into_shared();

    let handle = poller(&api, test_poller_config()).spawn();
    let updates = handle.subscribe();
    drop(handle);

    let outcome = tokio::time::timeout(DEADLINE, scout_client::poller::wait_for_outcome(updates))
        .await
        .unwrap();
    assert_eq!(outcome, PollOutcome::Cancelled);
}

#[tokio::test]
async fn first_request_waits_one_interval() {
    let api = ScriptedApi::new("R1").into_shared();
    let config = PollerConfig {
        interval: Duration::from_millis(500),
        max_duration: None,
    };

    let handle = poller(&api, config).spawn();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(api.status_calls(), 0);
    handle.cancel();
}

#[tokio::test]
async fn max_duration_times_out() {
    let api = ScriptedApi::new("R1").into_shared();
    let config = PollerConfig {
        interval: TEST_INTERVAL,
        max_duration: Some(TEST_INTERVAL * 3),
    };

    let handle = poller(&api, config).spawn();
    let outcome = tokio::time::timeout(DEADLINE, handle.wait()).await.unwrap();

    assert_matches!(outcome, PollOutcome::TimedOut(elapsed) if elapsed >= TEST_INTERVAL * 3);
}

#[tokio::test]
async fn progress_is_published_while_polling() {
    let api = ScriptedApi::new("R1")
        .with_statuses(vec![
            Ok(report("R1", ReportStatus::Processing, 25)),
            Ok(report("R1", ReportStatus::Processing, 75)),
            Ok(report("R1", ReportStatus::Completed, 100)),
        ])
        .into_shared();

    let handle = poller(&api, test_poller_config()).spawn();
    let mut updates = handle.subscribe();

    let mut seen = Vec::new();
    let collect = async {
        loop {
            if updates.changed().await.is_err() {
                break;
            }
            let snapshot = updates.borrow_and_update().clone();
            if let Some(r) = &snapshot.report {
                if seen.last() != Some(&r.progress) {
                    seen.push(r.progress);
                }
            }
            if snapshot.outcome.is_some() {
                break;
            }
        }
    };
    tokio::time::timeout(DEADLINE, collect).await.unwrap();

    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] < w[1]), "progress must not go backwards: {seen:?}");
}

/// A research server that accepts status requests and never answers them.
struct StalledApi;

#[async_trait]
impl ResearchApi for StalledApi {
    async fn generate_report(&self, _: &GenerateRequest) -> Result<GenerateResponse, ApiError> {
        std::future::pending().await
    }

    async fn get_report_status(&self, _: &str) -> Result<Report, ApiError> {
        std::future::pending().await
    }

    async fn get_reports(&self) -> Result<Vec<Report>, ApiError> {
        std::future::pending().await
    }

    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn max_duration_bounds_an_unanswered_request() {
    let max = Duration::from_millis(50);
    let handle = ReportPoller::new(
        Arc::new(StalledApi),
        "R1",
        PollerConfig {
            interval: TEST_INTERVAL,
            max_duration: Some(max),
        },
    )
    .spawn();

    let outcome = tokio::time::timeout(Duration::from_secs(2), handle.wait())
        .await
        .expect("poller must give up once the deadline passes");

    assert_matches!(outcome, PollOutcome::TimedOut(elapsed) if elapsed >= max);
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.state, PollState::Error);
    assert_eq!(snapshot.requests, 1);
}
