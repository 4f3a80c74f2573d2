//! HTTP surface of the hub.
//!
//! Translates requests into component calls, enforces the API key, and
//! serializes responses. Validation and authentication are recovered here;
//! the core components only ever see well-formed inputs.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use fraudlink_core::model::{
    short_id, Advisory, EntityActivity, GraphStats, PatternDetails, SeverityTier, Submission,
};

use crate::auth;
use crate::pipeline;
use crate::state::AppState;

/// Identity header required on submissions; must equal the payload's
/// `entity_id`.
pub const ENTITY_HEADER: &str = "x-entity-id";

/// Window for the entity activity endpoint.
const ACTIVITY_WINDOW_SECS: i64 = 86_400;

/// Default advisory page size.
const DEFAULT_ADVISORY_LIMIT: usize = 10;

/// Fingerprint nodes beyond this flip the health status to DEGRADED.
const HEALTHY_PATTERN_LIMIT: usize = 10_000;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(metrics))
        .route("/ingest", post(ingest))
        .route("/advisories", get(advisories_list))
        .route("/advisories/{advisory_id}", get(advisory_get))
        .route("/patterns/{fingerprint}", get(pattern_get))
        .route("/entities/{entity_id}/activity", get(entity_activity))
        .with_state(state)
}

/// Errors surfaced to clients. Everything else is impossible by
/// construction: the core components are total on well-formed input.
enum ApiError {
    Unauthorized(&'static str),
    BadRequest(String),
    NotFound(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

fn require_api_key(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let provided = headers
        .get(auth::API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    auth::authenticate(provided, &state.config.api_key).map_err(|msg| {
        warn!("request rejected: {msg}");
        ApiError::Unauthorized(msg)
    })
}

/// GET / -- service description, no auth.
async fn service_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "fraudlink-hub",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Collective fraud-intelligence coordinator",
        "status": "operational",
        "endpoints": {
            "health": "GET /health",
            "stats": "GET /stats",
            "metrics": "GET /metrics",
            "ingest": "POST /ingest",
            "advisories": "GET /advisories",
        },
    }))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: i64,
    timestamp: DateTime<Utc>,
    message: String,
}

/// GET /health -- liveness, no auth.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = state.clock.now();
    let pattern_count = state.graph.read().await.pattern_count();
    let advisory_count = state.advisories.lock().await.len();

    let graph_healthy = pattern_count < HEALTHY_PATTERN_LIMIT;
    let store_healthy = advisory_count < state.config.max_advisories;

    let (status, message) = if graph_healthy && store_healthy {
        ("HEALTHY", "All systems operational".to_string())
    } else {
        let mut issues = Vec::new();
        if !graph_healthy {
            issues.push("graph memory approaching limit");
        }
        if !store_healthy {
            issues.push("advisory store at capacity");
        }
        ("DEGRADED", format!("Issues detected: {}", issues.join("; ")))
    };

    Json(HealthResponse {
        status,
        uptime_seconds: (now - state.started_at).num_seconds(),
        timestamp: now,
        message,
    })
}

/// GET /stats -- graph metrics.
async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<GraphStats>, ApiError> {
    require_api_key(&state, &headers)?;
    let now = state.clock.now();
    let stats = state.graph.read().await.stats(now);
    Ok(Json(stats))
}

/// GET /metrics -- operational metrics.
async fn metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<crate::metrics::MetricsSummary>, ApiError> {
    require_api_key(&state, &headers)?;
    let now = state.clock.now();
    let summary = state.metrics.lock().await.summary(now);
    Ok(Json(summary))
}

#[derive(Debug, Serialize)]
struct IngestAck {
    status: &'static str,
    fingerprint: String,
    entity_id: String,
    correlation_detected: bool,
    message: &'static str,
}

/// POST /ingest -- submit a fingerprint observation.
///
/// The body is parsed by hand so malformed payloads map to 400 rather than
/// the extractor's default status.
async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<IngestAck>), ApiError> {
    require_api_key(&state, &headers)?;

    let submission: Submission = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid submission payload: {e}")))?;

    let claimed_identity = headers
        .get(ENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("missing X-Entity-ID header".to_string()))?;
    if claimed_identity != submission.entity_id {
        return Err(ApiError::BadRequest(
            "X-Entity-ID header does not match payload entity_id".to_string(),
        ));
    }

    let outcome = pipeline::ingest(&state, submission)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestAck {
            status: "accepted",
            fingerprint: format!("{}...", short_id(&outcome.fingerprint, 16)),
            entity_id: outcome.entity_id,
            correlation_detected: outcome.correlation_detected,
            message: "Fingerprint ingested successfully",
        }),
    ))
}

#[derive(Debug, Deserialize)]
struct AdvisoriesQuery {
    limit: Option<String>,
    severity: Option<String>,
}

/// GET /advisories -- most recent advisories, newest first.
///
/// Query params arrive as raw strings and are parsed by hand after the auth
/// check, so a bad param maps to the JSON 400 shape rather than the
/// extractor's default rejection and cannot bypass the 401.
async fn advisories_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdvisoriesQuery>,
) -> Result<Json<Vec<Advisory>>, ApiError> {
    require_api_key(&state, &headers)?;

    let severity = match query.severity.as_deref() {
        None => None,
        Some(raw) => Some(
            SeverityTier::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown severity filter: {raw}")))?,
        ),
    };
    let limit = match query.limit.as_deref() {
        None => DEFAULT_ADVISORY_LIMIT,
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| ApiError::BadRequest(format!("invalid limit: {raw}")))?,
    };

    let advisories = state.advisories.lock().await.list(limit, severity);
    Ok(Json(advisories))
}

/// GET /advisories/{advisory_id} -- single advisory lookup.
async fn advisory_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(advisory_id): Path<String>,
) -> Result<Json<Advisory>, ApiError> {
    require_api_key(&state, &headers)?;
    let store = state.advisories.lock().await;
    match store.get(&advisory_id) {
        Some(advisory) => Ok(Json(advisory.clone())),
        None => Err(ApiError::NotFound("advisory not found")),
    }
}

/// GET /patterns/{fingerprint} -- node stats plus recent reporters.
async fn pattern_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(fingerprint): Path<String>,
) -> Result<Json<PatternDetails>, ApiError> {
    require_api_key(&state, &headers)?;
    let now = state.clock.now();
    let window = Duration::seconds(state.config.time_window_seconds as i64);
    let details = state
        .graph
        .read()
        .await
        .pattern_details(&fingerprint, window, now);
    match details {
        Some(details) => Ok(Json(details)),
        None => Err(ApiError::NotFound("pattern not found")),
    }
}

/// GET /entities/{entity_id}/activity -- recent fingerprints for an entity.
async fn entity_activity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(entity_id): Path<String>,
) -> Result<Json<EntityActivity>, ApiError> {
    require_api_key(&state, &headers)?;
    let now = state.clock.now();
    let activity = state.graph.read().await.entity_activity(
        &entity_id,
        Duration::seconds(ACTIVITY_WINDOW_SECS),
        now,
    );
    match activity {
        Some(activity) => Ok(Json(activity)),
        None => Err(ApiError::NotFound("entity not found")),
    }
}
