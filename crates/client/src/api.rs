//! REST client for the external research server.
//!
//! Wraps the four research endpoints (generate, status, list, health) using
//! [`reqwest`]. Every call issues exactly one request; nothing is retried.

use async_trait::async_trait;
use scout_core::report::{Report, ReportStatus};
use serde::{Deserialize, Serialize};

use crate::config::{normalize_base_url, ClientConfig};

/// Errors from the research API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The research server returned a non-2xx status code.
    #[error("HTTP error! status: {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The configured base URL cannot carry endpoint paths.
    #[error("Invalid research server URL: {0}")]
    InvalidUrl(String),
}

/// Body of `POST /api/research/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub topic: String,
    pub research_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Response of `POST /api/research/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Identifier to poll with.
    pub report_id: String,
    #[serde(default)]
    pub status: Option<ReportStatus>,
    /// Any additional fields the server includes.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Liveness payload from `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `GET /api/research/reports` is accepted either as a bare array or
/// wrapped in `{ "reports": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReportList {
    Bare(Vec<Report>),
    Wrapped { reports: Vec<Report> },
}

impl From<ReportList> for Vec<Report> {
    fn from(list: ReportList) -> Self {
        match list {
            ReportList::Bare(reports) | ReportList::Wrapped { reports } => reports,
        }
    }
}

/// Operations offered by the research server.
///
/// [`ApiClient`] is the HTTP implementation; the poller and dashboard only
/// depend on this trait.
#[async_trait]
pub trait ResearchApi: Send + Sync {
    /// Queue a new research job and return its identifier.
    async fn generate_report(&self, request: &GenerateRequest)
        -> Result<GenerateResponse, ApiError>;

    /// Fetch the current state of one report.
    async fn get_report_status(&self, report_id: &str) -> Result<Report, ApiError>;

    /// Fetch every report known to the server.
    async fn get_reports(&self) -> Result<Vec<Report>, ApiError>;

    /// Check that the server is up.
    async fn health_check(&self) -> Result<HealthStatus, ApiError>;
}

/// HTTP client for the research server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    api_url: String,
}

impl ApiClient {
    /// Build a client from configuration, applying the optional request timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, &config.api_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: &str) -> Self {
        Self {
            client,
            api_url: normalize_base_url(api_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.api_url
    }

    // ---- private helpers ----

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, ApiError> {
        let invalid = |reason: &dyn std::fmt::Display| {
            ApiError::InvalidUrl(format!("{}: {reason}", self.api_url))
        };
        let mut url = reqwest::Url::parse(&self.api_url).map_err(|e| invalid(&e))?;
        url.path_segments_mut()
            .map_err(|()| invalid(&"not a base URL"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Status`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ResearchApi for ApiClient {
    async fn generate_report(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, ApiError> {
        let response = self
            .client
            .post(self.endpoint(&["api", "research", "generate"])?)
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn get_report_status(&self, report_id: &str) -> Result<Report, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&["api", "research", "status", report_id])?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn get_reports(&self) -> Result<Vec<Report>, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&["api", "research", "reports"])?)
            .send()
            .await?;

        let list: ReportList = Self::parse_response(response).await?;
        Ok(list.into())
    }

    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&["health"])?)
            .send()
            .await?;

        Self::parse_response(response).await
    }
}
