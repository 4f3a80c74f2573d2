//! Fraudlink hub daemon orchestration.
//!
//! The [`Hub`] struct ties the observation graph, temporal correlator,
//! escalation engine, advisory store, background pruner, and HTTP surface
//! into a single async process with graceful shutdown.

pub mod api;
pub mod auth;
pub mod metrics;
pub mod pipeline;
pub mod pruner;
pub mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use fraudlink_core::clock::{Clock, SystemClock};
use fraudlink_core::config::HubConfig;

use state::AppState;

/// The coordinator process.
pub struct Hub {
    state: AppState,
}

impl Hub {
    /// Hub on the system clock.
    pub fn new(config: HubConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Hub on an injected clock. Tests drive time through this.
    pub fn with_clock(config: HubConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: AppState::new(config, clock),
        }
    }

    /// Handle on the shared state, e.g. for tests.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.state.config.host, self.state.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding {addr}"))?;
        info!(addr = %addr, "fraudlink hub listening");
        self.serve(listener).await
    }

    /// Serve on an existing listener. Spawns the pruner, runs the HTTP
    /// server until SIGINT/SIGTERM, then stops the pruner.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let pruner = pruner::spawn(self.state.clone(), shutdown_rx);

        let app = api::router(self.state);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("serving HTTP")?;

        let _ = shutdown_tx.send(true);
        let _ = pruner.await;
        info!("fraudlink hub stopped");
        Ok(())
    }
}

/// Resolves on SIGINT or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
