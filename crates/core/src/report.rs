//! Research report model and status transitions.
//!
//! Reports are created and advanced by the external research server. The
//! types here only describe what the server sends back; nothing in this
//! workspace mutates a report's status.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a research report.
///
/// Transition rules (enforced by the research server, observed here):
/// - `pending`    -> `processing`, `completed`, `error`
/// - `processing` -> `completed`, `error`
/// - `completed`, `error` are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// Whether no further transitions are possible from this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Completed | Self::Error => 2,
        }
    }

    /// Whether moving from `self` to `next` respects the monotonic ordering.
    ///
    /// Staying in the same status is allowed (a poll may observe no change).
    pub fn can_advance_to(self, next: ReportStatus) -> bool {
        if self == next {
            return true;
        }
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Research types
// ---------------------------------------------------------------------------

/// The kinds of research offered on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchType {
    Academic,
    MarketAnalysis,
    CompetitiveIntelligence,
    TechnologyReview,
}

impl ResearchType {
    pub const ALL: [ResearchType; 4] = [
        Self::Academic,
        Self::MarketAnalysis,
        Self::CompetitiveIntelligence,
        Self::TechnologyReview,
    ];

    /// Wire value sent as `research_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::MarketAnalysis => "market_analysis",
            Self::CompetitiveIntelligence => "competitive_intelligence",
            Self::TechnologyReview => "technology_review",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Academic => "Academic Research",
            Self::MarketAnalysis => "Market Analysis",
            Self::CompetitiveIntelligence => "Competitive Intelligence",
            Self::TechnologyReview => "Technology Review",
        }
    }
}

impl std::str::FromStr for ResearchType {
    type Err = String;

    /// Accepts either the wire value or the display label (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| {
                t.as_str().eq_ignore_ascii_case(needle) || t.label().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
                format!(
                    "Unknown research type '{needle}'. Must be one of: {}",
                    valid.join(", ")
                )
            })
    }
}

// ---------------------------------------------------------------------------
// Report payloads
// ---------------------------------------------------------------------------

/// A research job record as returned by the research server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(alias = "report_id")]
    pub id: String,
    pub status: ReportStatus,
    /// Completion percentage, 0-100.
    #[serde(default)]
    pub progress: i32,
    pub created_at: Timestamp,
    pub topic: String,
    pub research_type: String,
    #[serde(default)]
    pub result: Option<ReportResult>,
    /// Failure description, when the server provides one.
    #[serde(default, alias = "error", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Report {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Generated output attached to a completed report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResult {
    pub title: String,
    pub executive_summary: String,
    pub word_count: i64,
    /// Any additional fields the server includes, preserved as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
