//! Read-only API handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use liveprobe_core::{Health, Outcome};
use liveprobe_health::{ProberManager, ServiceHealth};
use liveprobe_metrics::HealthGauges;
use serde::Serialize;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub manager: Arc<ProberManager>,
    pub gauges: Arc<HealthGauges>,
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/metrics", get(prometheus_metrics))
        .route("/health", get(list_health))
        .route("/health/{service}", get(get_health))
        .with_state(state)
}

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// One service as reported by `/health`.
#[derive(Debug, Serialize)]
struct HealthEntry {
    service: String,
    health: Health,
    /// Outcome of the most recent probe, absent before the first tick.
    status: Option<Outcome>,
    output: Option<String>,
    error: Option<String>,
}

impl HealthEntry {
    fn new(service: String, snapshot: ServiceHealth) -> Self {
        let (status, output, error) = match snapshot.last {
            Some(last) => (
                Some(last.status),
                Some(last.output),
                last.error.map(|e| e.to_string()),
            ),
            None => (None, None, None),
        };
        Self {
            service,
            health: snapshot.health,
            status,
            output,
            error,
        }
    }
}

/// GET /metrics
async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.gauges.render(),
    )
}

/// GET /health
async fn list_health(State(state): State<ApiState>) -> impl IntoResponse {
    let mut entries = Vec::new();
    for service in state.manager.services().await {
        // Skips a service removed between the two lookups.
        if let Some(snapshot) = state.manager.health(&service).await {
            entries.push(HealthEntry::new(service, snapshot));
        }
    }
    ApiResponse::ok(entries)
}

/// GET /health/{service}
async fn get_health(
    State(state): State<ApiState>,
    Path(service): Path<String>,
) -> impl IntoResponse {
    match state.manager.health(&service).await {
        Some(snapshot) => ApiResponse::ok(HealthEntry::new(service, snapshot)).into_response(),
        None => error_response("service not registered", StatusCode::NOT_FOUND).into_response(),
    }
}
