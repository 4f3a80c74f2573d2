//! Shared data model: submissions, observations, correlations, alerts,
//! advisories, and graph statistics.
//!
//! Everything that crosses the wire serializes with uppercase severity and
//! confidence labels and RFC 3339 UTC timestamps. Participants are called
//! "entities" on the wire; the hub treats both fingerprints and entity ids
//! as opaque strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk severity reported by a participant alongside a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Fraud-score adjustment contributed by the triggering submission.
    pub(crate) fn score_adjustment(&self) -> i32 {
        match self {
            Severity::Low => -5,
            Severity::Medium => 0,
            Severity::High => 5,
            Severity::Critical => 10,
        }
    }
}

/// The hub's classification of an escalated alert, driven by how many
/// distinct entities reported the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeverityTier {
    Medium,
    High,
    Critical,
}

impl SeverityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityTier::Medium => "MEDIUM",
            SeverityTier::High => "HIGH",
            SeverityTier::Critical => "CRITICAL",
        }
    }

    /// Parse an uppercase tier label, e.g. from a query parameter.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MEDIUM" => Some(SeverityTier::Medium),
            "HIGH" => Some(SeverityTier::High),
            "CRITICAL" => Some(SeverityTier::Critical),
            _ => None,
        }
    }
}

/// Qualitative confidence of a correlation, derived from entity count and
/// time span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "LOW",
            Confidence::Medium => "MEDIUM",
            Confidence::High => "HIGH",
        }
    }

    /// Fraud-score bonus for the correlation confidence.
    pub(crate) fn score_bonus(&self) -> i32 {
        match self {
            Confidence::High => 10,
            Confidence::Medium => 5,
            Confidence::Low => 0,
        }
    }
}

/// A fingerprint submission as received on the wire.
///
/// `timestamp` is optional; the hub substitutes its own clock when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub entity_id: String,
    pub fingerprint: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// One (entity, fingerprint, severity, timestamp) record -- an edge in the
/// observation graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub entity_id: String,
    pub fingerprint: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

/// Derived fact that a fingerprint was co-observed by enough distinct
/// entities inside the correlation window. Transient; never stored.
#[derive(Debug, Clone)]
pub struct Correlation {
    pub fingerprint: String,
    pub entity_count: usize,
    pub time_span_seconds: f64,
    pub confidence: Confidence,
    /// Supporting observations, chronological.
    pub observations: Vec<Observation>,
}

/// Escalated fraud-intent alert. Internal to the pipeline; advisories are
/// the external product.
#[derive(Debug, Clone)]
pub struct IntentAlert {
    pub alert_id: String,
    pub fingerprint: String,
    pub severity: SeverityTier,
    pub confidence: Confidence,
    pub fraud_score: u8,
    pub entity_count: usize,
    pub time_span_seconds: f64,
    pub rationale: String,
    pub timestamp: DateTime<Utc>,
}

/// Stored advisory served to participants. A recommendation, not a command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advisory {
    pub advisory_id: String,
    pub fingerprint: String,
    pub severity: SeverityTier,
    pub fraud_score: u8,
    pub entity_count: usize,
    pub confidence: Confidence,
    pub message: String,
    pub recommended_actions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Point-in-time statistics about the observation graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub unique_patterns: usize,
    pub total_observations: usize,
    pub active_entities: usize,
    pub memory_size_bytes: usize,
    pub temporal_coverage_seconds: i64,
}

/// Node-level view of a single fingerprint, served by the patterns endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PatternDetails {
    pub fingerprint: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub observation_count: usize,
    pub recent_entities: Vec<String>,
}

/// Recent activity summary for a single entity.
#[derive(Debug, Clone, Serialize)]
pub struct EntityActivity {
    pub entity_id: String,
    pub recent_fingerprints: Vec<String>,
    pub last_submission: DateTime<Utc>,
}

/// Truncate an opaque identifier for log lines and human-readable output.
pub fn short_id(s: &str, len: usize) -> &str {
    s.get(..len).unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_wire_labels_are_uppercase() {
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"HIGH\"");
        assert_eq!(
            serde_json::from_str::<Severity>("\"CRITICAL\"").unwrap(),
            Severity::Critical
        );
    }

    #[test]
    fn unknown_severity_is_rejected() {
        assert!(serde_json::from_str::<Severity>("\"SEVERE\"").is_err());
        assert!(serde_json::from_str::<Severity>("\"high\"").is_err());
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn tier_ordering_and_parse() {
        assert!(SeverityTier::Medium < SeverityTier::High);
        assert!(SeverityTier::High < SeverityTier::Critical);
        assert_eq!(SeverityTier::parse("HIGH"), Some(SeverityTier::High));
        assert_eq!(SeverityTier::parse("INFO"), None);
        assert_eq!(SeverityTier::parse("high"), None);
    }

    #[test]
    fn submission_timestamp_is_optional() {
        let s: Submission =
            serde_json::from_str(r#"{"entity_id":"a","fingerprint":"fp","severity":"LOW"}"#)
                .unwrap();
        assert!(s.timestamp.is_none());
    }

    #[test]
    fn short_id_handles_short_input() {
        assert_eq!(short_id("abcdef", 4), "abcd");
        assert_eq!(short_id("ab", 4), "ab");
        assert_eq!(short_id("", 8), "");
    }
}
