//! Advisory construction and bounded storage.
//!
//! Alerts are internal; advisories are what participants poll for. The
//! builder turns an intent alert into fixed, reproducible text (clients
//! match on the action strings), and the store keeps a bounded,
//! insertion-ordered history.

use std::collections::VecDeque;

use crate::model::{short_id, Advisory, IntentAlert, SeverityTier};

#[cfg(test)]
mod tests;

/// Recommended actions per tier. Ordering and wording are part of the wire
/// contract; change them and every client rule breaks.
const CRITICAL_ACTIONS: [&str; 6] = [
    "IMMEDIATE: Flag all activity matching this pattern for manual review",
    "IMMEDIATE: Apply temporary protective limits to affected accounts",
    "URGENT: Open a coordinated fraud investigation",
    "URGENT: Notify peer institutions of the active pattern",
    "RECOMMENDED: Share supporting indicators with peers via secure channel",
    "RECOMMENDED: Update local detection rules for this pattern",
];

const HIGH_ACTIONS: [&str; 5] = [
    "URGENT: Flag activity matching this pattern for priority review",
    "URGENT: Notify peer institutions of the pattern",
    "RECOMMENDED: Apply protective limits to affected accounts",
    "RECOMMENDED: Share supporting indicators with peers via secure channel",
    "OPTIONAL: Update local detection rules for this pattern",
];

const MEDIUM_ACTIONS: [&str; 4] = [
    "RECOMMENDED: Add matching activity to the monitoring queue",
    "RECOMMENDED: Notify peer institutions of the emerging pattern",
    "OPTIONAL: Review matching activity for false positives",
    "OPTIONAL: Update local detection rules for this pattern",
];

/// Build an advisory from an escalated alert.
pub fn build_advisory(alert: &IntentAlert) -> Advisory {
    Advisory {
        advisory_id: advisory_id(alert),
        fingerprint: alert.fingerprint.clone(),
        severity: alert.severity,
        fraud_score: alert.fraud_score,
        entity_count: alert.entity_count,
        confidence: alert.confidence,
        message: message(alert),
        recommended_actions: recommended_actions(alert.severity),
        timestamp: alert.timestamp,
    }
}

/// `ADV-<coarse timestamp>-<fingerprint prefix>`. Stable for a given alert.
fn advisory_id(alert: &IntentAlert) -> String {
    format!(
        "ADV-{}-{}",
        alert.timestamp.format("%Y%m%d-%H%M%S"),
        short_id(&alert.fingerprint, 8)
    )
}

fn recommended_actions(severity: SeverityTier) -> Vec<String> {
    let actions: &[&str] = match severity {
        SeverityTier::Critical => &CRITICAL_ACTIONS,
        SeverityTier::High => &HIGH_ACTIONS,
        SeverityTier::Medium => &MEDIUM_ACTIONS,
    };
    actions.iter().map(|a| a.to_string()).collect()
}

fn message(alert: &IntentAlert) -> String {
    format!(
        "Collective Fraud Advisory\n\
         \n\
         Severity: {severity}\n\
         Fraud Score: {score}/100\n\
         Confidence: {confidence}\n\
         \n\
         A coordinated behavioral pattern (id {fp}...) has been reported by \
         {count} distinct participants. {rationale}.\n\
         \n\
         This advisory is derived from opaque behavioral fingerprints only; \
         no transaction contents or customer data were shared between \
         participants.",
        severity = alert.severity.as_str(),
        score = alert.fraud_score,
        confidence = alert.confidence.as_str(),
        fp = short_id(&alert.fingerprint, 12),
        count = alert.entity_count,
        rationale = alert.rationale,
    )
}

/// Bounded, insertion-ordered advisory history.
///
/// Insertion order equals creation order; eviction drops the oldest entry
/// once the bound is reached.
#[derive(Debug)]
pub struct AdvisoryStore {
    advisories: VecDeque<Advisory>,
    capacity: usize,
}

impl AdvisoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            advisories: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append an advisory, evicting the oldest beyond capacity.
    pub fn push(&mut self, advisory: Advisory) {
        if self.advisories.len() == self.capacity {
            self.advisories.pop_front();
        }
        self.advisories.push_back(advisory);
    }

    /// The most recent advisories, newest first, optionally filtered by
    /// severity tier.
    pub fn list(&self, limit: usize, severity: Option<SeverityTier>) -> Vec<Advisory> {
        self.advisories
            .iter()
            .rev()
            .filter(|adv| severity.is_none_or(|s| adv.severity == s))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Look up a single advisory by id.
    pub fn get(&self, advisory_id: &str) -> Option<&Advisory> {
        self.advisories
            .iter()
            .find(|adv| adv.advisory_id == advisory_id)
    }

    /// All stored advisories for a fingerprint, oldest first.
    pub fn for_fingerprint(&self, fingerprint: &str) -> Vec<Advisory> {
        self.advisories
            .iter()
            .filter(|adv| adv.fingerprint == fingerprint)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.advisories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.advisories.is_empty()
    }
}
