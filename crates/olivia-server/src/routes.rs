//! HTTP routes and handlers

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use olivia_aggregator::{AnalysisRequest, SourceStatus};
use olivia_classifiers::SituationAnalysis;
use olivia_core::{AnalysisReport, LocationsResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::state::AppState;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Browser front-ends always allowed during local development
const LOCAL_ORIGINS: [&str; 2] = ["http://localhost:8501", "http://localhost:3000"];

pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/ready", get(readiness))
        .route("/api/recherche-complete", post(full_search))
        .route("/api/analyse", post(analyse))
        .route("/api/lieux-justice", get(justice_locations))
        .route("/api/test-apis", get(test_sources))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(server.body_limit_bytes))
        .layer(cors_layer(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(configured: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = LOCAL_ORIGINS
        .iter()
        .map(|o| o.to_string())
        .chain(configured.iter().cloned())
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct ReadyResponse {
    status: &'static str,
    timestamp: String,
    sources: Vec<String>,
    demo_mode: bool,
}

#[derive(Debug, Serialize)]
struct SourcesResponse {
    sources: Vec<SourceStatus>,
}

#[derive(Debug, Deserialize)]
struct LocationsQuery {
    code_postal: Option<String>,
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: now(),
    })
}

async fn readiness(State(state): State<AppState>) -> Json<ReadyResponse> {
    let sources = state
        .aggregator
        .registry()
        .ids()
        .into_iter()
        .map(|id| id.to_string())
        .collect();
    Json(ReadyResponse {
        status: "ready",
        timestamp: now(),
        sources,
        demo_mode: state.demo_mode,
    })
}

/// Analysis plus multi-source retrieval
async fn full_search(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    metrics::counter!("olivia_requests_total", "endpoint" => "recherche-complete").increment(1);
    let Json(request) = payload?;
    let request_id = Uuid::new_v4();
    let start = Instant::now();

    info!(
        %request_id,
        chars = request.description_situation.chars().count(),
        postal_code = request.postal_code().is_some(),
        "Received full search request"
    );

    let report: AnalysisReport = state.aggregator.aggregate(&request).await?;

    info!(
        %request_id,
        matches = report.harm_matches.len(),
        degraded = report.is_degraded(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Full search complete"
    );

    let mut response = Json(report).into_response();
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID, value);
    }
    Ok(response)
}

/// Classification, interactions, complexity and estimate without retrieval
async fn analyse(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<SituationAnalysis>, AppError> {
    metrics::counter!("olivia_requests_total", "endpoint" => "analyse").increment(1);
    let Json(request) = payload?;
    let analysis = state.aggregator.analyze(&request.description_situation)?;
    Ok(Json(analysis))
}

async fn justice_locations(
    State(state): State<AppState>,
    Query(query): Query<LocationsQuery>,
) -> Result<Json<LocationsResponse>, AppError> {
    metrics::counter!("olivia_requests_total", "endpoint" => "lieux-justice").increment(1);
    let code = query
        .code_postal
        .ok_or_else(|| AppError::InvalidRequest("code_postal is required".to_string()))?;
    let response = state.aggregator.locate(&code).await?;
    Ok(Json(response))
}

async fn test_sources(State(state): State<AppState>) -> Json<SourcesResponse> {
    metrics::counter!("olivia_requests_total", "endpoint" => "test-apis").increment(1);
    Json(SourcesResponse {
        sources: state.aggregator.health().await,
    })
}

async fn metrics(State(state): State<AppState>) -> Result<String, AppError> {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .ok_or_else(|| AppError::NotFound("metrics recorder not installed".to_string()))
}

async fn fallback() -> AppError {
    AppError::NotFound("Not found".to_string())
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    InvalidRequest(String),
    NotFound(String),
    Configuration(String),
    Internal(String),
}

impl From<olivia_core::Error> for AppError {
    fn from(err: olivia_core::Error) -> Self {
        match err {
            olivia_core::Error::InvalidInput(msg) => AppError::InvalidRequest(msg),
            olivia_core::Error::Config(msg) => AppError::Configuration(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request_error", msg)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::Configuration(msg) => {
                error!("Configuration error while serving request: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", msg)
            }
            AppError::Internal(msg) => {
                error!("Internal error while serving request: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        let body = json!({
            "error": {
                "message": message,
                "type": kind,
            }
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_status() {
        let response = AppError::from(olivia_core::Error::invalid_input("empty")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::from(olivia_core::Error::config("bad lexicon")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = AppError::from(olivia_core::Error::internal("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invalid_cors_origin_is_skipped() {
        // Building the layer must not panic on a bad value
        let _ = cors_layer(&["https://olivia.example".to_string(), "bad\norigin".to_string()]);
    }
}
