//! Hub configuration, loaded from environment variables.
//!
//! Every knob has a default suitable for local development. Validation runs
//! at startup; the daemon exits nonzero on any violation so a misconfigured
//! hub never serves traffic.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Placeholder key accepted outside production mode.
pub const DEV_API_KEY: &str = "dev-key-change-in-production";

/// Top-level hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,

    /// Minimum distinct entities for a correlation.
    pub entity_threshold: usize,
    /// Correlation sliding window in seconds.
    pub time_window_seconds: u64,

    /// Entity counts at which alerts escalate to each tier.
    pub critical_threshold: usize,
    pub high_threshold: usize,
    pub medium_threshold: usize,

    /// Observations older than this are pruned from the graph.
    pub max_graph_age_seconds: u64,
    /// Interval between pruner ticks.
    pub prune_interval_seconds: u64,

    /// Bound on the advisory store; oldest advisories are evicted beyond it.
    pub max_advisories: usize,

    /// Shared secret expected in the `x-api-key` header.
    pub api_key: String,
    /// Production mode requires an explicit API key.
    pub production: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            entity_threshold: 2,
            time_window_seconds: 300,
            critical_threshold: 4,
            high_threshold: 3,
            medium_threshold: 2,
            max_graph_age_seconds: 3600,
            prune_interval_seconds: 300,
            max_advisories: 1000,
            api_key: DEV_API_KEY.to_string(),
            production: false,
        }
    }
}

impl HubConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Exists so tests can exercise parsing and validation without mutating
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let production = matches!(
            lookup("HUB_ENV").as_deref(),
            Some("production") | Some("prod")
        );

        let api_key = match lookup("HUB_API_KEY") {
            Some(key) if !key.trim().is_empty() => key,
            _ if production => return Err(ConfigError::MissingApiKey),
            _ => defaults.api_key,
        };

        let config = Self {
            host: lookup("HUB_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "HUB_PORT", defaults.port)?,
            entity_threshold: parse_var(&lookup, "ENTITY_THRESHOLD", defaults.entity_threshold)?,
            time_window_seconds: parse_var(
                &lookup,
                "TIME_WINDOW_SECONDS",
                defaults.time_window_seconds,
            )?,
            critical_threshold: parse_var(
                &lookup,
                "CRITICAL_THRESHOLD",
                defaults.critical_threshold,
            )?,
            high_threshold: parse_var(&lookup, "HIGH_THRESHOLD", defaults.high_threshold)?,
            medium_threshold: parse_var(&lookup, "MEDIUM_THRESHOLD", defaults.medium_threshold)?,
            max_graph_age_seconds: parse_var(
                &lookup,
                "MAX_GRAPH_AGE_SECONDS",
                defaults.max_graph_age_seconds,
            )?,
            prune_interval_seconds: parse_var(
                &lookup,
                "PRUNE_INTERVAL_SECONDS",
                defaults.prune_interval_seconds,
            )?,
            max_advisories: parse_var(&lookup, "MAX_ADVISORIES", defaults.max_advisories)?,
            api_key,
            production,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check threshold ordering and bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(invalid("HUB_PORT", "must be nonzero"));
        }
        if self.entity_threshold < 2 {
            return Err(invalid("ENTITY_THRESHOLD", "must be >= 2"));
        }
        if self.time_window_seconds < 1 {
            return Err(invalid("TIME_WINDOW_SECONDS", "must be >= 1"));
        }
        if self.medium_threshold < 2 {
            return Err(invalid("MEDIUM_THRESHOLD", "must be >= 2"));
        }
        if !(self.medium_threshold <= self.high_threshold
            && self.high_threshold <= self.critical_threshold)
        {
            return Err(invalid(
                "CRITICAL_THRESHOLD",
                "escalation thresholds must satisfy medium <= high <= critical",
            ));
        }
        if self.max_graph_age_seconds < 60 {
            return Err(invalid("MAX_GRAPH_AGE_SECONDS", "must be >= 60"));
        }
        if self.prune_interval_seconds < 10 {
            return Err(invalid("PRUNE_INTERVAL_SECONDS", "must be >= 10"));
        }
        if self.max_advisories < 1 {
            return Err(invalid("MAX_ADVISORIES", "must be >= 1"));
        }
        Ok(())
    }
}

fn invalid(var: &'static str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        message: message.to_string(),
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::NotANumber {
            var,
            value: raw,
        }),
        None => Ok(default),
    }
}
