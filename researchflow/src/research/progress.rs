//! Research progress assessment.
//!
//! An assessment is recomputed from scratch on every call. Nothing is merged
//! with earlier assessments; callers carry findings forward themselves.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Number of gaps named in a "continue" recommendation.
pub const MAX_GAPS_IN_RECOMMENDATION: usize = 2;

/// Whether the gathered evidence answers the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    /// Enough evidence to answer.
    Sufficient,
    /// More research is wanted.
    NeedsMore,
}

impl Readiness {
    /// Parses free text from a planner.
    ///
    /// Only `"sufficient"` (any casing) maps to `Sufficient`; everything else,
    /// including the empty string, maps to `NeedsMore`.
    #[must_use]
    pub fn parse_lenient(text: &str) -> Self {
        if text.eq_ignore_ascii_case("sufficient") {
            Self::Sufficient
        } else {
            Self::NeedsMore
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sufficient => "sufficient",
            Self::NeedsMore => "needs_more",
        }
    }
}

impl FromStr for Readiness {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Arguments of one assessment call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentInput {
    /// Sources reviewed so far, best first.
    #[serde(default)]
    pub ranked_sources: Vec<String>,
    /// Facts established so far.
    #[serde(default)]
    pub key_findings: Vec<String>,
    /// What is still missing.
    #[serde(default)]
    pub critical_gaps: Vec<String>,
    /// Free-text readiness verdict.
    #[serde(default)]
    pub readiness_level: String,
}

impl AssessmentInput {
    /// Creates an input with a readiness verdict and nothing else.
    #[must_use]
    pub fn new(readiness_level: impl Into<String>) -> Self {
        Self {
            readiness_level: readiness_level.into(),
            ..Self::default()
        }
    }

    /// Adds a ranked source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.ranked_sources.push(source.into());
        self
    }

    /// Adds a finding.
    #[must_use]
    pub fn with_finding(mut self, finding: impl Into<String>) -> Self {
        self.key_findings.push(finding.into());
        self
    }

    /// Adds a gap.
    #[must_use]
    pub fn with_gap(mut self, gap: impl Into<String>) -> Self {
        self.critical_gaps.push(gap.into());
        self
    }
}

/// Accumulated evidence of a session and the continue/stop decision.
///
/// Invariant: `should_continue == (readiness == NeedsMore && !critical_gaps.is_empty())`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchState {
    /// Number of ranked sources.
    pub reviewed_count: usize,
    /// Sources reviewed, best first.
    pub ranked_sources: Vec<String>,
    /// Facts established.
    pub key_findings: Vec<String>,
    /// Outstanding gaps.
    pub critical_gaps: Vec<String>,
    /// Parsed readiness.
    pub readiness: Readiness,
    /// Whether more research calls are warranted.
    pub should_continue: bool,
    /// Next step for the planner.
    pub recommendation: String,
}

impl ResearchState {
    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("sources_reviewed".to_string(), serde_json::json!(self.reviewed_count));
        dict.insert("ranked_sources".to_string(), serde_json::json!(self.ranked_sources));
        dict.insert("key_findings".to_string(), serde_json::json!(self.key_findings));
        dict.insert("critical_gaps".to_string(), serde_json::json!(self.critical_gaps));
        dict.insert("readiness".to_string(), serde_json::json!(self.readiness.as_str()));
        dict.insert("should_continue".to_string(), serde_json::json!(self.should_continue));
        dict.insert("recommendation".to_string(), serde_json::json!(self.recommendation));
        dict
    }
}

/// Computes `ResearchState` from caller-supplied evidence.
///
/// Total over arbitrary text: never fails, never panics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressTracker;

impl ProgressTracker {
    /// Creates a tracker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Assesses progress.
    ///
    /// "Sufficient" always stops the session. "Needs more" without any gap
    /// also stops, since there is nothing concrete left to pursue.
    #[must_use]
    pub fn assess(&self, input: AssessmentInput) -> ResearchState {
        let readiness = Readiness::parse_lenient(&input.readiness_level);
        let should_continue =
            readiness == Readiness::NeedsMore && !input.critical_gaps.is_empty();

        let recommendation = if should_continue {
            let focus: Vec<&str> = input
                .critical_gaps
                .iter()
                .take(MAX_GAPS_IN_RECOMMENDATION)
                .map(String::as_str)
                .collect();
            format!("Continue research focusing on: {}", focus.join("; "))
        } else {
            "Research is complete enough. Call finalize to synthesize the final answer."
                .to_string()
        };

        debug!(
            readiness = %readiness,
            sources = input.ranked_sources.len(),
            gaps = input.critical_gaps.len(),
            should_continue,
            "progress assessed"
        );

        ResearchState {
            reviewed_count: input.ranked_sources.len(),
            ranked_sources: input.ranked_sources,
            key_findings: input.key_findings,
            critical_gaps: input.critical_gaps,
            readiness,
            should_continue,
            recommendation,
        }
    }
}
