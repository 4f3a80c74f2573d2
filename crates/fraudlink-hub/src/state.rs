//! Shared state threaded through the HTTP handlers.
//!
//! Lock discipline: the graph's RwLock first, then the escalation marks,
//! and the advisory store only after the graph lock is released. No I/O
//! happens under any of these locks.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};

use fraudlink_core::advisory::AdvisoryStore;
use fraudlink_core::clock::Clock;
use fraudlink_core::config::HubConfig;
use fraudlink_core::correlation::{CorrelatorConfig, TemporalCorrelator};
use fraudlink_core::escalation::{EscalationConfig, EscalationEngine};
use fraudlink_core::graph::ObservationGraph;
use fraudlink_core::model::SeverityTier;

use crate::metrics::MetricsTracker;

/// Metrics measurement window.
const METRICS_WINDOW_SECS: i64 = 3600;

/// Highest severity tier already fired per fingerprint. An advisory fires
/// again only when a later correlation raises the tier; the pruner clears
/// entries when a fingerprint decays out of the graph.
pub type EscalationMarks = HashMap<String, SeverityTier>;

/// Everything the handlers, pipeline, and pruner share.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<HubConfig>,
    pub clock: Arc<dyn Clock>,
    pub graph: Arc<RwLock<ObservationGraph>>,
    pub advisories: Arc<Mutex<AdvisoryStore>>,
    pub escalation_marks: Arc<Mutex<EscalationMarks>>,
    pub metrics: Arc<Mutex<MetricsTracker>>,
    pub correlator: Arc<TemporalCorrelator>,
    pub escalator: Arc<EscalationEngine>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: HubConfig, clock: Arc<dyn Clock>) -> Self {
        let correlator = TemporalCorrelator::new(CorrelatorConfig::from_hub(&config));
        let escalator = EscalationEngine::new(EscalationConfig::from_hub(&config));
        let advisories = AdvisoryStore::new(config.max_advisories);
        let started_at = clock.now();

        Self {
            config: Arc::new(config),
            clock,
            graph: Arc::new(RwLock::new(ObservationGraph::new())),
            advisories: Arc::new(Mutex::new(advisories)),
            escalation_marks: Arc::new(Mutex::new(HashMap::new())),
            metrics: Arc::new(Mutex::new(MetricsTracker::new(Duration::seconds(
                METRICS_WINDOW_SECS,
            )))),
            correlator: Arc::new(correlator),
            escalator: Arc::new(escalator),
            started_at,
        }
    }
}
