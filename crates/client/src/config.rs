use std::time::Duration;

/// Default research server address.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default delay between status requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Research server base URL, without a trailing slash.
    pub api_url: String,
    /// Delay between status requests.
    pub poll_interval: Duration,
    /// Give up polling after this long. `None` polls until a terminal status.
    pub poll_max_duration: Option<Duration>,
    /// Per-request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_max_duration: None,
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `RESEARCH_API_URL`              | `http://localhost:8000` |
    /// | `RESEARCH_POLL_INTERVAL_MS`     | `2000`                  |
    /// | `RESEARCH_POLL_MAX_SECS`        | unset                   |
    /// | `RESEARCH_REQUEST_TIMEOUT_SECS` | unset                   |
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_env() -> Self {
        let api_url = std::env::var("RESEARCH_API_URL")
            .map(|url| normalize_base_url(&url))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let poll_interval = env_u64("RESEARCH_POLL_INTERVAL_MS")
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        let poll_max_duration = env_u64("RESEARCH_POLL_MAX_SECS").map(Duration::from_secs);
        let request_timeout = env_u64("RESEARCH_REQUEST_TIMEOUT_SECS").map(Duration::from_secs);

        Self {
            api_url,
            poll_interval,
            poll_max_duration,
            request_timeout,
        }
    }
}

/// Strip whitespace and trailing slashes so paths can be appended verbatim.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
