//! Temporal correlation.
//!
//! One report of a pattern is noise. The same fingerprint reported by
//! several distinct entities inside a short window is intelligence. The
//! correlator is a pure function over the observation graph: it never
//! mutates anything and is driven entirely by the caller's `now`.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::HubConfig;
use crate::graph::ObservationGraph;
use crate::model::{Confidence, Correlation};

/// Correlation thresholds and confidence boundaries.
#[derive(Debug, Clone)]
pub struct CorrelatorConfig {
    /// Minimum distinct entities for any correlation.
    pub entity_threshold: usize,
    /// Sliding window over which observations count.
    pub time_window: Duration,
    /// HIGH confidence: at least this many entities...
    pub high_entities: usize,
    /// ...inside this span.
    pub high_span: Duration,
    /// MEDIUM confidence boundaries, analogous.
    pub medium_entities: usize,
    pub medium_span: Duration,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self {
            entity_threshold: 2,
            time_window: Duration::seconds(300),
            high_entities: 3,
            high_span: Duration::seconds(180),
            medium_entities: 2,
            medium_span: Duration::seconds(300),
        }
    }
}

impl CorrelatorConfig {
    /// Thresholds from hub configuration; confidence boundaries keep their
    /// defaults.
    pub fn from_hub(config: &HubConfig) -> Self {
        Self {
            entity_threshold: config.entity_threshold,
            time_window: Duration::seconds(config.time_window_seconds as i64),
            ..Self::default()
        }
    }
}

/// Detects cross-entity correlations for a single fingerprint.
#[derive(Debug, Clone)]
pub struct TemporalCorrelator {
    config: CorrelatorConfig,
}

impl TemporalCorrelator {
    pub fn new(config: CorrelatorConfig) -> Self {
        Self { config }
    }

    /// Return the correlation for `fingerprint`, or `None` when fewer than
    /// `entity_threshold` distinct entities reported it inside the window.
    pub fn detect(
        &self,
        graph: &ObservationGraph,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Option<Correlation> {
        let observations = graph.recent_observations(fingerprint, self.config.time_window, now);
        if observations.is_empty() {
            return None;
        }

        let mut entity_ids: Vec<&str> = observations
            .iter()
            .map(|obs| obs.entity_id.as_str())
            .collect();
        entity_ids.sort_unstable();
        entity_ids.dedup();
        let entity_count = entity_ids.len();

        if entity_count < self.config.entity_threshold {
            debug!(
                fingerprint = crate::model::short_id(fingerprint, 12),
                entity_count,
                threshold = self.config.entity_threshold,
                "correlation threshold not met"
            );
            return None;
        }

        // Observations are chronological; span is last minus first.
        let time_span_seconds = match (observations.first(), observations.last()) {
            (Some(first), Some(last)) => {
                (last.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0
            }
            _ => 0.0,
        };

        let confidence = self.confidence(entity_count, time_span_seconds);

        Some(Correlation {
            fingerprint: fingerprint.to_string(),
            entity_count,
            time_span_seconds,
            confidence,
            observations,
        })
    }

    /// More entities inside a shorter span means higher confidence. Both
    /// boundaries are inclusive.
    fn confidence(&self, entity_count: usize, time_span_seconds: f64) -> Confidence {
        let high_span = self.config.high_span.num_milliseconds() as f64 / 1000.0;
        let medium_span = self.config.medium_span.num_milliseconds() as f64 / 1000.0;

        if entity_count >= self.config.high_entities && time_span_seconds <= high_span {
            Confidence::High
        } else if entity_count >= self.config.medium_entities && time_span_seconds <= medium_span {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::model::Severity;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    fn correlator() -> TemporalCorrelator {
        TemporalCorrelator::new(CorrelatorConfig::default())
    }

    fn graph_with(observations: &[(&str, i64)]) -> ObservationGraph {
        let mut graph = ObservationGraph::new();
        for (entity, offset_secs) in observations {
            graph.add_observation(
                entity,
                "fp_1",
                Severity::High,
                t0() + Duration::seconds(*offset_secs),
            );
        }
        graph
    }

    #[test]
    fn detects_correlation_at_threshold() {
        // Exactly entity_threshold distinct entities inside the window.
        let graph = graph_with(&[("entity_a", 0), ("entity_b", 60)]);
        let correlation = correlator()
            .detect(&graph, "fp_1", t0() + Duration::seconds(90))
            .unwrap();

        assert_eq!(correlation.entity_count, 2);
        assert_eq!(correlation.time_span_seconds, 60.0);
        assert_eq!(correlation.confidence, Confidence::Medium);
        assert_eq!(correlation.observations.len(), 2);
    }

    #[test]
    fn single_entity_is_not_a_correlation() {
        let graph = graph_with(&[("entity_a", 0), ("entity_a", 10), ("entity_a", 20)]);
        assert!(correlator()
            .detect(&graph, "fp_1", t0() + Duration::seconds(30))
            .is_none());
    }

    #[test]
    fn unknown_fingerprint_is_none() {
        let graph = ObservationGraph::new();
        assert!(correlator().detect(&graph, "fp_1", t0()).is_none());
    }

    #[test]
    fn observations_outside_window_do_not_count() {
        // Second entity's observation has slid out of the window by `now`.
        let graph = graph_with(&[("entity_a", 0), ("entity_b", 400)]);
        let now = t0() + Duration::seconds(400 + 301);
        assert!(correlator().detect(&graph, "fp_1", now).is_none());
    }

    #[test]
    fn high_confidence_needs_three_entities_in_short_span() {
        let graph = graph_with(&[("entity_a", 0), ("entity_b", 30), ("entity_c", 120)]);
        let correlation = correlator()
            .detect(&graph, "fp_1", t0() + Duration::seconds(150))
            .unwrap();

        assert_eq!(correlation.entity_count, 3);
        assert_eq!(correlation.confidence, Confidence::High);
    }

    #[test]
    fn high_boundary_is_inclusive() {
        // Span exactly 180s with three entities is still HIGH.
        let graph = graph_with(&[("entity_a", 0), ("entity_b", 90), ("entity_c", 180)]);
        let correlation = correlator()
            .detect(&graph, "fp_1", t0() + Duration::seconds(200))
            .unwrap();
        assert_eq!(correlation.confidence, Confidence::High);
    }

    #[test]
    fn wide_span_downgrades_confidence() {
        let graph = graph_with(&[("entity_a", 0), ("entity_b", 100), ("entity_c", 250)]);
        let correlation = correlator()
            .detect(&graph, "fp_1", t0() + Duration::seconds(280))
            .unwrap();
        // Three entities but spread over 250s: not HIGH, still within the
        // MEDIUM span.
        assert_eq!(correlation.confidence, Confidence::Medium);
    }

    #[test]
    fn unrelated_fingerprints_are_independent() {
        let mut graph = graph_with(&[("entity_a", 0), ("entity_b", 10)]);
        graph.add_observation("entity_z", "fp_other", Severity::Critical, t0());

        let now = t0() + Duration::seconds(20);
        let before = correlator().detect(&graph, "fp_1", now).unwrap();

        graph.add_observation("entity_y", "fp_other", Severity::Critical, now);
        let after = correlator().detect(&graph, "fp_1", now).unwrap();

        assert_eq!(before.entity_count, after.entity_count);
        assert_eq!(before.confidence, after.confidence);
        assert_eq!(before.time_span_seconds, after.time_span_seconds);
    }
}
