//! Rolling-window operational metrics.
//!
//! Counters ride a sliding one-hour window; latency and fraud-score samples
//! are capped so a long-lived hub never grows without bound. Served at
//! `GET /metrics` for dashboards.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use fraudlink_core::model::SeverityTier;

const LATENCY_SAMPLE_CAP: usize = 10_000;
const SCORE_SAMPLE_CAP: usize = 1_000;

/// Snapshot of hub throughput and performance.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub fingerprints_ingested: usize,
    pub correlations_detected: usize,
    pub alerts_escalated: usize,
    pub advisories_generated: usize,
    pub avg_ingestion_latency_ms: f64,
    pub p95_ingestion_latency_ms: f64,
    pub avg_fraud_score: f64,
    pub advisories_by_severity: HashMap<String, u64>,
    pub submissions_by_entity: HashMap<String, u64>,
    pub measurement_window_seconds: i64,
    pub timestamp: DateTime<Utc>,
}

/// Tracks hub operational metrics over a rolling window.
#[derive(Debug)]
pub struct MetricsTracker {
    window: Duration,
    ingested: VecDeque<DateTime<Utc>>,
    correlations: VecDeque<DateTime<Utc>>,
    escalations: VecDeque<DateTime<Utc>>,
    advisories: VecDeque<DateTime<Utc>>,
    ingest_latencies_ms: VecDeque<f64>,
    fraud_scores: VecDeque<u8>,
    advisories_by_severity: HashMap<String, u64>,
    submissions_by_entity: HashMap<String, u64>,
}

impl MetricsTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            ingested: VecDeque::new(),
            correlations: VecDeque::new(),
            escalations: VecDeque::new(),
            advisories: VecDeque::new(),
            ingest_latencies_ms: VecDeque::new(),
            fraud_scores: VecDeque::new(),
            advisories_by_severity: HashMap::new(),
            submissions_by_entity: HashMap::new(),
        }
    }

    pub fn record_ingestion(&mut self, entity_id: &str, latency_ms: f64, now: DateTime<Utc>) {
        self.ingested.push_back(now);
        if self.ingest_latencies_ms.len() == LATENCY_SAMPLE_CAP {
            self.ingest_latencies_ms.pop_front();
        }
        self.ingest_latencies_ms.push_back(latency_ms);
        *self
            .submissions_by_entity
            .entry(entity_id.to_string())
            .or_insert(0) += 1;
        self.trim(now);
    }

    pub fn record_correlation(&mut self, now: DateTime<Utc>) {
        self.correlations.push_back(now);
    }

    pub fn record_escalation(&mut self, now: DateTime<Utc>) {
        self.escalations.push_back(now);
    }

    pub fn record_advisory(&mut self, severity: SeverityTier, fraud_score: u8, now: DateTime<Utc>) {
        self.advisories.push_back(now);
        *self
            .advisories_by_severity
            .entry(severity.as_str().to_string())
            .or_insert(0) += 1;
        if self.fraud_scores.len() == SCORE_SAMPLE_CAP {
            self.fraud_scores.pop_front();
        }
        self.fraud_scores.push_back(fraud_score);
    }

    /// Current summary; counters reflect the rolling window ending at `now`.
    pub fn summary(&mut self, now: DateTime<Utc>) -> MetricsSummary {
        self.trim(now);

        MetricsSummary {
            fingerprints_ingested: self.ingested.len(),
            correlations_detected: self.correlations.len(),
            alerts_escalated: self.escalations.len(),
            advisories_generated: self.advisories.len(),
            avg_ingestion_latency_ms: mean(self.ingest_latencies_ms.iter().copied()),
            p95_ingestion_latency_ms: p95(&self.ingest_latencies_ms),
            avg_fraud_score: mean(self.fraud_scores.iter().map(|&s| f64::from(s))),
            advisories_by_severity: self.advisories_by_severity.clone(),
            submissions_by_entity: self.submissions_by_entity.clone(),
            measurement_window_seconds: self.window.num_seconds(),
            timestamp: now,
        }
    }

    /// Drop window counters that slid out of the measurement window.
    fn trim(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        for series in [
            &mut self.ingested,
            &mut self.correlations,
            &mut self.escalations,
            &mut self.advisories,
        ] {
            while series.front().is_some_and(|ts| *ts < cutoff) {
                series.pop_front();
            }
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn p95(samples: &VecDeque<f64>) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = samples.iter().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = ((sorted.len() as f64) * 0.95).ceil() as usize;
    sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    fn tracker() -> MetricsTracker {
        MetricsTracker::new(Duration::seconds(3600))
    }

    #[test]
    fn counts_reflect_recorded_events() {
        let mut m = tracker();
        m.record_ingestion("entity_a", 1.5, t0());
        m.record_ingestion("entity_b", 2.5, t0());
        m.record_correlation(t0());
        m.record_escalation(t0());
        m.record_advisory(SeverityTier::Medium, 50, t0());

        let summary = m.summary(t0());
        assert_eq!(summary.fingerprints_ingested, 2);
        assert_eq!(summary.correlations_detected, 1);
        assert_eq!(summary.alerts_escalated, 1);
        assert_eq!(summary.advisories_generated, 1);
        assert_eq!(summary.avg_ingestion_latency_ms, 2.0);
        assert_eq!(summary.advisories_by_severity.get("MEDIUM"), Some(&1));
        assert_eq!(summary.submissions_by_entity.get("entity_a"), Some(&1));
        assert_eq!(summary.avg_fraud_score, 50.0);
    }

    #[test]
    fn window_counters_expire() {
        let mut m = tracker();
        m.record_ingestion("entity_a", 1.0, t0());
        m.record_correlation(t0());

        let later = t0() + Duration::seconds(3601);
        let summary = m.summary(later);
        assert_eq!(summary.fingerprints_ingested, 0);
        assert_eq!(summary.correlations_detected, 0);
    }

    #[test]
    fn empty_tracker_summary_is_zeroed() {
        let mut m = tracker();
        let summary = m.summary(t0());
        assert_eq!(summary.fingerprints_ingested, 0);
        assert_eq!(summary.avg_ingestion_latency_ms, 0.0);
        assert_eq!(summary.p95_ingestion_latency_ms, 0.0);
        assert_eq!(summary.avg_fraud_score, 0.0);
    }

    #[test]
    fn p95_picks_high_tail() {
        let mut m = tracker();
        for i in 1..=100 {
            m.record_ingestion("entity_a", f64::from(i), t0());
        }
        let summary = m.summary(t0());
        assert_eq!(summary.p95_ingestion_latency_ms, 95.0);
    }
}
