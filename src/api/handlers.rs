use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use crate::context::RuntimeContext;
use crate::evaluator::{CycleSummary, ExpiryEvaluator};
use crate::history::{AlertHistory, DedupMode};

/// Application state shared across handlers
pub struct AppState {
    pub evaluator: Arc<ExpiryEvaluator>,
    pub ctx: Arc<RuntimeContext>,
    pub log_path: PathBuf,
    pub auth_token: String,
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub checked_at: Option<DateTime<Utc>>,
    pub domains: Vec<String>,
    pub thresholds: Vec<u32>,
    pub dedup: DedupMode,
    pub last_cycle: Option<CycleSummary>,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        started_at: state.ctx.started_at(),
        uptime_secs: state.ctx.uptime().as_secs(),
        checked_at: state.ctx.checked_at(),
        domains: state.evaluator.domains().to_vec(),
        thresholds: state.evaluator.thresholds().to_vec(),
        dedup: state.evaluator.dedup_mode(),
        last_cycle: state.ctx.last_cycle(),
    })
}

// ============================================================================
// Logs
// ============================================================================

const DEFAULT_LOG_LINES: usize = 100;

#[derive(Deserialize)]
pub struct LogsQuery {
    pub lines: Option<String>,
}

#[derive(Serialize)]
pub struct LogsResponse {
    pub lines: usize,
    pub total: usize,
    pub logs: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

pub async fn logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, ApiError> {
    let lines = match query.lines {
        Some(raw) => {
            let lines: usize = raw
                .parse()
                .map_err(|_| ApiError::BadRequest("Invalid lines parameter".to_string()))?;
            if lines < 1 {
                return Err(ApiError::BadRequest(
                    "Lines parameter must be positive".to_string(),
                ));
            }
            lines
        }
        None => DEFAULT_LOG_LINES,
    };

    let content = match tokio::fs::read_to_string(&state.log_path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::NotFound("Log file does not exist yet".to_string()))
        }
        Err(e) => return Err(ApiError::Internal(format!("Failed to read log file: {}", e))),
    };

    let all: Vec<&str> = content.lines().collect();
    let total = all.len();
    let start = total.saturating_sub(lines);

    Ok(Json(LogsResponse {
        lines,
        total,
        logs: all[start..].iter().map(|line| line.to_string()).collect(),
        timestamp: Utc::now(),
    }))
}

// ============================================================================
// History
// ============================================================================

pub async fn history(State(state): State<Arc<AppState>>) -> Result<Json<AlertHistory>, ApiError> {
    let store = state.evaluator.store().clone();
    let history = tokio::task::spawn_blocking(move || store.load())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(history))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
