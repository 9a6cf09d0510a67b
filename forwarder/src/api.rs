//! Ingestion HTTP API.
//!
//! Exposes five routes:
//! - `POST /api/events` — forward a call, dispatching on its `type`
//! - `POST /api/identify` — forward a call as identify
//! - `POST /api/track` — forward a call as track
//! - `GET /api/destinations` — list destinations with forwarding counters
//! - `GET /health` — liveness probe

use crate::{Destination, DestinationResponse, DestinationStatus, ForwardError};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures::future::join_all;
use relay::{EventKind, RelayEvent};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state for the ingestion API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub destinations: Vec<Arc<dyn Destination>>,
    pub status: Arc<Mutex<HashMap<String, DestinationStatus>>>,
}

impl ApiState {
    pub fn new(destinations: Vec<Arc<dyn Destination>>) -> Self {
        let status = destinations
            .iter()
            .map(|d| (d.name().to_string(), DestinationStatus::default()))
            .collect();
        Self {
            destinations,
            status: Arc::new(Mutex::new(status)),
        }
    }
}

/// Outcome of one forwarded call at one destination.
#[derive(Debug, Serialize)]
pub struct DestinationResult {
    pub destination: String,
    /// `forwarded`, `skipped` (no rule applied) or `failed`
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<DestinationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

/// Response body for the forwarding routes.
#[derive(Debug, Serialize)]
pub struct ForwardSummary {
    pub message_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub results: Vec<DestinationResult>,
}

/// A single entry in the `GET /api/destinations` response.
#[derive(Serialize)]
pub struct DestinationInfo {
    pub name: String,
    #[serde(flatten)]
    pub status: DestinationStatus,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

// ---------------------------------------------------------------------------
// Business logic (called from HTTP handlers and unit tests)
// ---------------------------------------------------------------------------

/// Validates a call and forwards it to every destination.
///
/// `forced` overrides the call's own `type`. Destinations are called
/// concurrently and reported in registration order. Validation failures
/// are returned before any destination is called.
pub async fn handle_event(
    state: &ApiState,
    mut event: RelayEvent,
    forced: Option<EventKind>,
) -> Result<(StatusCode, ForwardSummary), ForwardError> {
    if let Some(kind) = forced {
        event.event_type = kind.as_str().to_string();
    }
    event.validate_and_prepare()?;

    let outcomes = join_all(state.destinations.iter().map(|d| d.forward(&event))).await;

    let mut http_status = StatusCode::OK;
    let mut results = Vec::with_capacity(outcomes.len());
    let mut counters = state.status.lock().await;
    for (destination, outcome) in state.destinations.iter().zip(outcomes) {
        let name = destination.name().to_string();
        let entry = counters.entry(name.clone()).or_default();
        let result = match outcome {
            Ok(response) => {
                entry.record_success();
                DestinationResult {
                    destination: name,
                    status: if response.is_some() { "forwarded" } else { "skipped" },
                    response,
                    error: None,
                    error_kind: None,
                }
            }
            Err(e) => {
                warn!(destination = %name, error = %e, "Destination failed");
                entry.record_error(&e.to_string());
                if http_status == StatusCode::OK {
                    http_status = status_for(&e);
                }
                DestinationResult {
                    destination: name,
                    status: "failed",
                    response: None,
                    error: Some(e.to_string()),
                    error_kind: Some(e.kind()),
                }
            }
        };
        results.push(result);
    }
    drop(counters);

    let summary = ForwardSummary {
        message_id: event.message_id.clone().unwrap_or_default(),
        event_type: event.event_type.clone(),
        results,
    };
    info!(
        message_id = %summary.message_id,
        event_type = %summary.event_type,
        status = http_status.as_u16(),
        "Event handled"
    );
    Ok((http_status, summary))
}

/// HTTP status reported for a forwarding failure.
pub fn status_for(error: &ForwardError) -> StatusCode {
    match error {
        ForwardError::Validation(_) => StatusCode::BAD_REQUEST,
        ForwardError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ForwardError::DestinationRejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ForwardError::Authentication(_)
        | ForwardError::SessionExpired { .. }
        | ForwardError::MalformedResponse { .. }
        | ForwardError::Transport(_) => StatusCode::BAD_GATEWAY,
    }
}

// ---------------------------------------------------------------------------
// HTTP handlers
// ---------------------------------------------------------------------------

async fn post_event(
    State(state): State<Arc<ApiState>>,
    Json(event): Json<RelayEvent>,
) -> Result<(StatusCode, Json<ForwardSummary>), AppError> {
    let (status, summary) = handle_event(&state, event, None).await?;
    Ok((status, Json(summary)))
}

async fn post_identify(
    State(state): State<Arc<ApiState>>,
    Json(event): Json<RelayEvent>,
) -> Result<(StatusCode, Json<ForwardSummary>), AppError> {
    let (status, summary) = handle_event(&state, event, Some(EventKind::Identify)).await?;
    Ok((status, Json(summary)))
}

async fn post_track(
    State(state): State<Arc<ApiState>>,
    Json(event): Json<RelayEvent>,
) -> Result<(StatusCode, Json<ForwardSummary>), AppError> {
    let (status, summary) = handle_event(&state, event, Some(EventKind::Track)).await?;
    Ok((status, Json(summary)))
}

async fn list_destinations(State(state): State<Arc<ApiState>>) -> Json<Vec<DestinationInfo>> {
    let counters = state.status.lock().await;
    let destinations = state
        .destinations
        .iter()
        .map(|d| DestinationInfo {
            name: d.name().to_string(),
            status: counters.get(d.name()).cloned().unwrap_or_default(),
        })
        .collect();
    Json(destinations)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

struct AppError(ForwardError);

impl From<ForwardError> for AppError {
    fn from(e: ForwardError) -> Self {
        AppError(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError(e) = self;
        (
            status_for(&e),
            Json(ErrorResponse {
                error: e.to_string(),
                kind: e.kind(),
            }),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/events", post(post_event))
        .route("/api/identify", post(post_identify))
        .route("/api/track", post(post_track))
        .route("/api/destinations", get(list_destinations))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
