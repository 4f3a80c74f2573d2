//! Time-stamped bipartite observation graph.
//!
//! Entities sit on one side, pattern fingerprints on the other, and every
//! submission becomes a (entity, fingerprint, severity, timestamp) edge.
//! Multiple edges between the same pair are allowed -- observations are a
//! multiset. The graph is represented as two index tables, each keyed node
//! holding its incident observation list, so recency queries never scan the
//! whole structure.
//!
//! Boundary conventions (tested):
//! - recency: an observation at exactly `now - window` is included;
//! - pruning: an observation at exactly `max_age` old remains, strictly
//!   older is evicted.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::model::{EntityActivity, GraphStats, Observation, PatternDetails, Severity};


/// Window used by [`ObservationGraph::stats`] when counting active entities.
const ACTIVE_ENTITY_WINDOW_SECS: i64 = 3600;

/// Rough per-node and per-edge memory estimates for the stats endpoint.
const NODE_SIZE_ESTIMATE: usize = 200;
const EDGE_SIZE_ESTIMATE: usize = 300;

/// A fingerprint node: lifetime attributes plus incident observations.
#[derive(Debug, Clone)]
struct PatternNode {
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    observations: Vec<Observation>,
}

/// An entity node: the observations this entity has submitted.
#[derive(Debug, Clone, Default)]
struct EntityNode {
    observations: Vec<Observation>,
}

/// Outcome of a prune pass.
#[derive(Debug, Clone, Default)]
pub struct PruneOutcome {
    pub edges_removed: usize,
    pub nodes_removed: usize,
    /// Fingerprints whose nodes were removed entirely. The caller uses this
    /// to reset per-pattern escalation state.
    pub removed_fingerprints: Vec<String>,
}

/// In-memory bipartite multigraph of pattern observations.
///
/// All operations are total: unknown fingerprints and entities yield empty
/// results, never errors. Methods take `now` explicitly; the graph holds no
/// clock.
#[derive(Debug, Default)]
pub struct ObservationGraph {
    patterns: HashMap<String, PatternNode>,
    entities: HashMap<String, EntityNode>,
    edge_count: usize,
}

impl ObservationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one observation, lazily creating both endpoint nodes.
    pub fn add_observation(
        &mut self,
        entity_id: &str,
        fingerprint: &str,
        severity: Severity,
        timestamp: DateTime<Utc>,
    ) {
        let observation = Observation {
            entity_id: entity_id.to_string(),
            fingerprint: fingerprint.to_string(),
            severity,
            timestamp,
        };

        let node = self
            .patterns
            .entry(fingerprint.to_string())
            .or_insert_with(|| PatternNode {
                first_seen: timestamp,
                last_seen: timestamp,
                observations: Vec::new(),
            });
        // Client timestamps may arrive out of order.
        node.first_seen = node.first_seen.min(timestamp);
        node.last_seen = node.last_seen.max(timestamp);
        node.observations.push(observation.clone());

        self.entities
            .entry(entity_id.to_string())
            .or_default()
            .observations
            .push(observation);

        self.edge_count += 1;
    }

    /// Observations of `fingerprint` with `timestamp >= now - window`,
    /// chronological. Empty for unknown fingerprints.
    pub fn recent_observations(
        &self,
        fingerprint: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Vec<Observation> {
        let cutoff = now - window;
        let Some(node) = self.patterns.get(fingerprint) else {
            return Vec::new();
        };
        let mut recent: Vec<Observation> = node
            .observations
            .iter()
            .filter(|obs| obs.timestamp >= cutoff)
            .cloned()
            .collect();
        recent.sort_by_key(|obs| obs.timestamp);
        recent
    }

    /// Count of distinct entities with a recent observation of `fingerprint`.
    pub fn unique_entities(&self, fingerprint: &str, window: Duration, now: DateTime<Utc>) -> usize {
        let recent = self.recent_observations(fingerprint, window, now);
        let mut ids: Vec<&str> = recent.iter().map(|obs| obs.entity_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Entity ids with at least one observation inside the window, sorted.
    pub fn active_entities(&self, window: Duration, now: DateTime<Utc>) -> Vec<String> {
        let cutoff = now - window;
        let mut active: Vec<String> = self
            .entities
            .iter()
            .filter(|(_, node)| node.observations.iter().any(|obs| obs.timestamp >= cutoff))
            .map(|(id, _)| id.clone())
            .collect();
        active.sort_unstable();
        active
    }

    /// Evict observations strictly older than `max_age` and drop any node
    /// left with no incident edges.
    pub fn prune(&mut self, max_age: Duration, now: DateTime<Utc>) -> PruneOutcome {
        let cutoff = now - max_age;
        let mut outcome = PruneOutcome::default();

        self.patterns.retain(|fingerprint, node| {
            let before = node.observations.len();
            node.observations.retain(|obs| obs.timestamp >= cutoff);
            outcome.edges_removed += before - node.observations.len();
            if node.observations.is_empty() {
                outcome.nodes_removed += 1;
                outcome.removed_fingerprints.push(fingerprint.clone());
                false
            } else {
                true
            }
        });

        self.entities.retain(|_, node| {
            node.observations.retain(|obs| obs.timestamp >= cutoff);
            if node.observations.is_empty() {
                outcome.nodes_removed += 1;
                false
            } else {
                true
            }
        });

        self.edge_count -= outcome.edges_removed;

        if outcome.edges_removed > 0 {
            debug!(
                edges = outcome.edges_removed,
                nodes = outcome.nodes_removed,
                "pruned expired observations"
            );
        }
        outcome
    }

    /// Point-in-time graph statistics.
    pub fn stats(&self, now: DateTime<Utc>) -> GraphStats {
        let oldest = self
            .patterns
            .values()
            .flat_map(|node| node.observations.iter())
            .map(|obs| obs.timestamp)
            .min();

        let temporal_coverage_seconds = oldest
            .map(|ts| (now - ts).num_seconds().max(0))
            .unwrap_or(0);

        GraphStats {
            unique_patterns: self.patterns.len(),
            total_observations: self.edge_count,
            active_entities: self
                .active_entities(Duration::seconds(ACTIVE_ENTITY_WINDOW_SECS), now)
                .len(),
            memory_size_bytes: (self.patterns.len() + self.entities.len()) * NODE_SIZE_ESTIMATE
                + self.edge_count * EDGE_SIZE_ESTIMATE,
            temporal_coverage_seconds,
        }
    }

    /// Node attributes for a fingerprint plus the distinct entities that
    /// reported it inside the window. `None` for unknown fingerprints.
    pub fn pattern_details(
        &self,
        fingerprint: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Option<PatternDetails> {
        let node = self.patterns.get(fingerprint)?;
        let recent = self.recent_observations(fingerprint, window, now);
        let mut recent_entities: Vec<String> =
            recent.into_iter().map(|obs| obs.entity_id).collect();
        recent_entities.sort_unstable();
        recent_entities.dedup();

        Some(PatternDetails {
            fingerprint: fingerprint.to_string(),
            first_seen: node.first_seen,
            last_seen: node.last_seen,
            observation_count: node.observations.len(),
            recent_entities,
        })
    }

    /// Recent fingerprints and last submission time for an entity. `None`
    /// for unknown entities.
    pub fn entity_activity(
        &self,
        entity_id: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Option<EntityActivity> {
        let node = self.entities.get(entity_id)?;
        let cutoff = now - window;

        let mut recent: Vec<&Observation> = node
            .observations
            .iter()
            .filter(|obs| obs.timestamp >= cutoff)
            .collect();
        recent.sort_by_key(|obs| obs.timestamp);

        let mut recent_fingerprints = Vec::new();
        for obs in &recent {
            if !recent_fingerprints.contains(&obs.fingerprint) {
                recent_fingerprints.push(obs.fingerprint.clone());
            }
        }

        // Entity nodes always carry at least one observation after pruning.
        let last_submission = node.observations.iter().map(|obs| obs.timestamp).max()?;

        Some(EntityActivity {
            entity_id: entity_id.to_string(),
            recent_fingerprints,
            last_submission,
        })
    }

    /// Number of observations currently incident to a fingerprint node.
    pub fn observation_count(&self, fingerprint: &str) -> usize {
        self.patterns
            .get(fingerprint)
            .map(|node| node.observations.len())
            .unwrap_or(0)
    }

    /// Total number of edges in the graph.
    pub fn total_observations(&self) -> usize {
        self.edge_count
    }

    /// Number of fingerprint nodes.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Number of entity nodes.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}
