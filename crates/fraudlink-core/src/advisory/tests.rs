use chrono::{DateTime, Duration, TimeZone, Utc};

use super::*;
use crate::model::{Confidence, IntentAlert};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
}

fn alert(severity: SeverityTier) -> IntentAlert {
    IntentAlert {
        alert_id: "ALT-20260314120000-fp_a3d7e".to_string(),
        fingerprint: "fp_a3d7e9f2c1b5a8e4".to_string(),
        severity,
        confidence: Confidence::High,
        fraud_score: 90,
        entity_count: 4,
        time_span_seconds: 120.0,
        rationale:
            "Pattern observed by 4 distinct participants within 120 seconds (confidence HIGH)"
                .to_string(),
        timestamp: t0(),
    }
}

fn advisory_at(offset_secs: i64, severity: SeverityTier) -> Advisory {
    let mut a = alert(severity);
    a.timestamp = t0() + Duration::seconds(offset_secs);
    a.fingerprint = format!("fp_{offset_secs}");
    build_advisory(&a)
}

#[test]
fn advisory_carries_alert_fields() {
    let advisory = build_advisory(&alert(SeverityTier::Critical));
    assert_eq!(advisory.fingerprint, "fp_a3d7e9f2c1b5a8e4");
    assert_eq!(advisory.severity, SeverityTier::Critical);
    assert_eq!(advisory.fraud_score, 90);
    assert_eq!(advisory.entity_count, 4);
    assert_eq!(advisory.confidence, Confidence::High);
    assert_eq!(advisory.timestamp, t0());
}

#[test]
fn advisory_id_encodes_timestamp_and_fingerprint() {
    let advisory = build_advisory(&alert(SeverityTier::High));
    assert_eq!(advisory.advisory_id, "ADV-20260314-120000-fp_a3d7e");
}

#[test]
fn action_counts_per_tier() {
    assert_eq!(
        build_advisory(&alert(SeverityTier::Critical))
            .recommended_actions
            .len(),
        6
    );
    assert_eq!(
        build_advisory(&alert(SeverityTier::High))
            .recommended_actions
            .len(),
        5
    );
    assert_eq!(
        build_advisory(&alert(SeverityTier::Medium))
            .recommended_actions
            .len(),
        4
    );
}

#[test]
fn critical_actions_lead_with_immediate_steps() {
    let actions = build_advisory(&alert(SeverityTier::Critical)).recommended_actions;
    assert_eq!(
        actions[0],
        "IMMEDIATE: Flag all activity matching this pattern for manual review"
    );
    assert_eq!(
        actions[1],
        "IMMEDIATE: Apply temporary protective limits to affected accounts"
    );
    assert!(actions[2].starts_with("URGENT:"));
    assert!(actions[5].starts_with("RECOMMENDED:"));
}

#[test]
fn medium_actions_are_advisory_only() {
    let actions = build_advisory(&alert(SeverityTier::Medium)).recommended_actions;
    assert!(actions.iter().all(|a| {
        a.starts_with("RECOMMENDED:") || a.starts_with("OPTIONAL:")
    }));
}

#[test]
fn message_states_severity_score_confidence_and_rationale() {
    let advisory = build_advisory(&alert(SeverityTier::Critical));
    assert!(advisory.message.contains("Severity: CRITICAL"));
    assert!(advisory.message.contains("Fraud Score: 90/100"));
    assert!(advisory.message.contains("Confidence: HIGH"));
    assert!(advisory.message.contains(
        "Pattern observed by 4 distinct participants within 120 seconds (confidence HIGH)"
    ));
    // Fingerprint appears only truncated.
    assert!(advisory.message.contains("fp_a3d7e9f2c"));
    assert!(!advisory.message.contains("fp_a3d7e9f2c1b5a8e4"));
}

#[test]
fn message_is_reproducible() {
    let a = build_advisory(&alert(SeverityTier::High));
    let b = build_advisory(&alert(SeverityTier::High));
    assert_eq!(a.message, b.message);
    assert_eq!(a.recommended_actions, b.recommended_actions);
}

#[test]
fn store_keeps_insertion_order_newest_first() {
    let mut store = AdvisoryStore::new(10);
    for i in 0..3 {
        store.push(advisory_at(i, SeverityTier::Medium));
    }
    let listed = store.list(10, None);
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].fingerprint, "fp_2");
    assert_eq!(listed[2].fingerprint, "fp_0");
}

#[test]
fn store_evicts_oldest_beyond_capacity() {
    let mut store = AdvisoryStore::new(2);
    for i in 0..5 {
        store.push(advisory_at(i, SeverityTier::Medium));
        assert!(store.len() <= 2);
    }
    let listed = store.list(10, None);
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].fingerprint, "fp_4");
    assert_eq!(listed[1].fingerprint, "fp_3");
}

#[test]
fn list_respects_limit_and_severity_filter() {
    let mut store = AdvisoryStore::new(10);
    store.push(advisory_at(0, SeverityTier::Medium));
    store.push(advisory_at(1, SeverityTier::Critical));
    store.push(advisory_at(2, SeverityTier::Medium));

    assert_eq!(store.list(2, None).len(), 2);

    let critical = store.list(10, Some(SeverityTier::Critical));
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].fingerprint, "fp_1");

    assert!(store.list(10, Some(SeverityTier::High)).is_empty());
}

#[test]
fn get_finds_by_id() {
    let mut store = AdvisoryStore::new(10);
    let advisory = advisory_at(0, SeverityTier::High);
    let id = advisory.advisory_id.clone();
    store.push(advisory);

    assert!(store.get(&id).is_some());
    assert!(store.get("ADV-nope").is_none());
}

#[test]
fn for_fingerprint_returns_all_matching() {
    let mut store = AdvisoryStore::new(10);
    let mut a = alert(SeverityTier::Medium);
    a.fingerprint = "fp_same".to_string();
    store.push(build_advisory(&a));
    a.severity = SeverityTier::High;
    a.timestamp = t0() + Duration::seconds(30);
    store.push(build_advisory(&a));
    store.push(advisory_at(60, SeverityTier::Medium));

    let matching = store.for_fingerprint("fp_same");
    assert_eq!(matching.len(), 2);
    assert_eq!(matching[0].severity, SeverityTier::Medium);
    assert_eq!(matching[1].severity, SeverityTier::High);
}
