//! Escalation from correlations to fraud-intent alerts.
//!
//! Not every correlation is fraud. Tier thresholds on the distinct-entity
//! count keep the false-positive rate down, and the numeric fraud score
//! summarizes alert strength for downstream consumers. The engine is pure:
//! no I/O, no state.

use chrono::{DateTime, Utc};

use crate::config::HubConfig;
use crate::model::{short_id, Correlation, IntentAlert, Severity, SeverityTier};

/// Entity-count thresholds for each alert tier.
#[derive(Debug, Clone)]
pub struct EscalationConfig {
    pub critical_threshold: usize,
    pub high_threshold: usize,
    pub medium_threshold: usize,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            critical_threshold: 4,
            high_threshold: 3,
            medium_threshold: 2,
        }
    }
}

impl EscalationConfig {
    pub fn from_hub(config: &HubConfig) -> Self {
        Self {
            critical_threshold: config.critical_threshold,
            high_threshold: config.high_threshold,
            medium_threshold: config.medium_threshold,
        }
    }
}

/// Fraud score is capped at this base before bonuses.
const BASE_SCORE_CAP: i32 = 80;
/// Per-entity contribution to the base score.
const SCORE_PER_ENTITY: i32 = 20;
/// Spans longer than this lose points; slow spread is weaker evidence of
/// coordination.
const RECENCY_PENALTY_SPAN_SECS: f64 = 600.0;
const RECENCY_PENALTY: i32 = 10;

/// Converts correlations into optional intent alerts.
#[derive(Debug, Clone)]
pub struct EscalationEngine {
    config: EscalationConfig,
}

impl EscalationEngine {
    pub fn new(config: EscalationConfig) -> Self {
        Self { config }
    }

    /// Evaluate a correlation together with the severity the triggering
    /// submission carried. Returns `None` below the MEDIUM threshold.
    pub fn evaluate(
        &self,
        correlation: &Correlation,
        submission_severity: Severity,
        now: DateTime<Utc>,
    ) -> Option<IntentAlert> {
        let severity = self.tier(correlation.entity_count)?;
        let fraud_score = fraud_score(correlation, submission_severity);

        Some(IntentAlert {
            alert_id: alert_id(&correlation.fingerprint, now),
            fingerprint: correlation.fingerprint.clone(),
            severity,
            confidence: correlation.confidence,
            fraud_score,
            entity_count: correlation.entity_count,
            time_span_seconds: correlation.time_span_seconds,
            rationale: rationale(correlation),
            timestamp: now,
        })
    }

    fn tier(&self, entity_count: usize) -> Option<SeverityTier> {
        if entity_count >= self.config.critical_threshold {
            Some(SeverityTier::Critical)
        } else if entity_count >= self.config.high_threshold {
            Some(SeverityTier::High)
        } else if entity_count >= self.config.medium_threshold {
            Some(SeverityTier::Medium)
        } else {
            None
        }
    }
}

/// Numeric alert strength in [0, 100].
///
/// Base `min(80, 20 * entities)`, plus a confidence bonus, minus a recency
/// penalty for slow spreads, adjusted by the triggering submission severity.
fn fraud_score(correlation: &Correlation, submission_severity: Severity) -> u8 {
    let mut score = (correlation.entity_count as i32 * SCORE_PER_ENTITY).min(BASE_SCORE_CAP);
    score += correlation.confidence.score_bonus();
    if correlation.time_span_seconds > RECENCY_PENALTY_SPAN_SECS {
        score -= RECENCY_PENALTY;
    }
    score += submission_severity.score_adjustment();
    score.clamp(0, 100) as u8
}

fn rationale(correlation: &Correlation) -> String {
    format!(
        "Pattern observed by {} distinct participants within {:.0} seconds (confidence {})",
        correlation.entity_count,
        correlation.time_span_seconds,
        correlation.confidence.as_str()
    )
}

fn alert_id(fingerprint: &str, now: DateTime<Utc>) -> String {
    format!(
        "ALT-{}-{}",
        now.format("%Y%m%d%H%M%S"),
        short_id(fingerprint, 8)
    )
}
