//! Submission ingestion pipeline.
//!
//! Single entry point for accepted submissions: update the graph, run
//! correlation, run escalation, and append any resulting advisory. The
//! whole add -> correlate -> escalate sequence runs under the graph write
//! lock so correlation sees exactly the state it just wrote and concurrent
//! submissions for the same fingerprint cannot double-fire an advisory.
//! The advisory store is only locked after the graph lock is released.

use std::time::Instant;

use chrono::Duration;
use thiserror::Error;
use tracing::{info, warn};

use fraudlink_core::advisory::build_advisory;
use fraudlink_core::model::{short_id, Advisory, Submission};

use crate::state::AppState;

/// Maximum tolerated submission timestamp skew ahead of server time.
const MAX_FUTURE_SKEW_SECS: i64 = 60;

/// Validation failure; maps to 400 at the API boundary. A rejected
/// submission leaves no trace in the graph or the advisory store.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct IngestError(pub String);

/// Result of an accepted submission.
#[derive(Debug)]
pub struct IngestOutcome {
    pub fingerprint: String,
    pub entity_id: String,
    pub correlation_detected: bool,
    pub advisory: Option<Advisory>,
}

/// Process one submission end to end.
pub async fn ingest(state: &AppState, submission: Submission) -> Result<IngestOutcome, IngestError> {
    let started = Instant::now();
    let now = state.clock.now();

    if submission.fingerprint.trim().is_empty() {
        return Err(IngestError("fingerprint must not be empty".to_string()));
    }
    if submission.entity_id.trim().is_empty() {
        return Err(IngestError("entity_id must not be empty".to_string()));
    }

    let timestamp = submission.timestamp.unwrap_or(now);
    if timestamp > now + Duration::seconds(MAX_FUTURE_SKEW_SECS) {
        return Err(IngestError(format!(
            "timestamp is more than {MAX_FUTURE_SKEW_SECS}s ahead of server time"
        )));
    }

    info!(
        entity = %submission.entity_id,
        fingerprint = short_id(&submission.fingerprint, 12),
        severity = submission.severity.as_str(),
        "ingesting fingerprint"
    );

    let (correlation_detected, escalated, advisory) = {
        let mut graph = state.graph.write().await;
        graph.add_observation(
            &submission.entity_id,
            &submission.fingerprint,
            submission.severity,
            timestamp,
        );

        let correlation = state
            .correlator
            .detect(&graph, &submission.fingerprint, now);
        let correlation_detected = correlation.is_some();

        let alert = correlation
            .as_ref()
            .and_then(|c| state.escalator.evaluate(c, submission.severity, now));
        let escalated = alert.is_some();

        let advisory = match alert {
            Some(alert) => {
                let mut marks = state.escalation_marks.lock().await;
                let rising = marks
                    .get(&alert.fingerprint)
                    .is_none_or(|fired| alert.severity > *fired);
                if rising {
                    marks.insert(alert.fingerprint.clone(), alert.severity);
                    warn!(
                        alert_id = %alert.alert_id,
                        severity = alert.severity.as_str(),
                        fraud_score = alert.fraud_score,
                        entities = alert.entity_count,
                        "fraud intent escalated"
                    );
                    Some(build_advisory(&alert))
                } else {
                    None
                }
            }
            None => None,
        };

        (correlation_detected, escalated, advisory)
    };

    if let Some(ref advisory) = advisory {
        let mut store = state.advisories.lock().await;
        store.push(advisory.clone());
        info!(advisory_id = %advisory.advisory_id, "advisory generated");
    }

    {
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        let mut metrics = state.metrics.lock().await;
        metrics.record_ingestion(&submission.entity_id, latency_ms, now);
        if correlation_detected {
            metrics.record_correlation(now);
        }
        if escalated {
            metrics.record_escalation(now);
        }
        if let Some(ref advisory) = advisory {
            metrics.record_advisory(advisory.severity, advisory.fraud_score, now);
        }
    }

    Ok(IngestOutcome {
        fingerprint: submission.fingerprint,
        entity_id: submission.entity_id,
        correlation_detected,
        advisory,
    })
}
