use assessment_core::AssessmentReport;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tokio::time::Instant;
use tower_http::request_id::RequestId;

use crate::{request_id_text, AppError, AppState};

pub fn assess_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/assess", post(assess))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Runs one assessment under the configured deadline. Expiry drops the in-flight
/// future, and a report that completes after the deadline is discarded too. No
/// partial report is ever returned.
async fn assess(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AssessmentReport>, AppError> {
    let Json(payload) = payload?;
    let request_id = request_id_text(request_id.as_ref().map(|Extension(id)| id));

    let deadline = Instant::now() + state.assessment_timeout;
    let finished = tokio::time::timeout_at(deadline, state.orchestrator.assess(&payload)).await;
    let report = match finished {
        Ok(result) if Instant::now() <= deadline => result?,
        _ => {
            return Err(AppError::Internal(format!(
                "request {} exceeded the {:?} deadline",
                request_id, state.assessment_timeout
            )))
        }
    };

    tracing::info!(
        "Request {} assessed: credit {:.2}, risk {:.2}, label {}",
        request_id,
        report.credit_score,
        report.risk_score,
        report.health_label
    );

    Ok(Json(report))
}
