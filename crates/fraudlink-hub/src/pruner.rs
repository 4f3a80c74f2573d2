//! Periodic background eviction of expired observations.
//!
//! Bounds memory and the temporal scope of correlation evidence: once a
//! fingerprint's last observation ages out, old co-observations can no
//! longer resurrect a correlation, and its escalation mark is cleared so a
//! future recurrence can fire a fresh advisory.

use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::state::AppState;

/// Spawn the pruner task. It runs until `shutdown` flips and exits within
/// one tick.
pub fn spawn(state: AppState, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = Duration::from_secs(state.config.prune_interval_seconds);
        let max_age = ChronoDuration::seconds(state.config.max_graph_age_seconds as i64);

        let mut interval = tokio::time::interval(period);
        // The first tick resolves immediately; consume it so the loop waits
        // a full period before the first prune.
        interval.tick().await;

        info!(
            period_secs = state.config.prune_interval_seconds,
            max_age_secs = state.config.max_graph_age_seconds,
            "pruner started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = state.clock.now();
                    let outcome = state.graph.write().await.prune(max_age, now);

                    if !outcome.removed_fingerprints.is_empty() {
                        let mut marks = state.escalation_marks.lock().await;
                        for fingerprint in &outcome.removed_fingerprints {
                            marks.remove(fingerprint);
                        }
                    }

                    if outcome.edges_removed > 0 {
                        info!(
                            edges = outcome.edges_removed,
                            nodes = outcome.nodes_removed,
                            "pruned expired observations"
                        );
                    } else {
                        debug!("prune tick: nothing expired");
                    }
                }
                _ = shutdown.changed() => {
                    info!("pruner stopping");
                    break;
                }
            }
        }
    })
}
