//! Batch import API handlers
//!
//! POST /api/import-questions/validate, POST /api/import-questions

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    models::{RawRecord, RejectedBatch, ValidationReport},
    AppState,
};

/// POST /api/import-questions/validate request
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub questions: Vec<RawRecord>,
}

/// POST /api/import-questions request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    #[serde(default)]
    pub questions: Vec<RawRecord>,
    /// Content-owner tag; `MES` when omitted
    pub created_by: Option<String>,
}

/// POST /api/import-questions/validate
///
/// Full validation result for every row, nothing persisted.
pub async fn validate_questions(
    State(state): State<AppState>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> ApiResult<Json<ValidationReport>> {
    let Json(request) = payload?;
    let report = state.importer.validate(&request.questions);

    tracing::info!(
        records = request.questions.len(),
        valid = report.valid_questions.len(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "Validation pre-check"
    );

    Ok(Json(report))
}

/// POST /api/import-questions
///
/// Runs one batch import. Returns 409 while another import is running and
/// 400 with a rejection report when the whole batch is refused.
pub async fn import_questions(
    State(state): State<AppState>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    let _guard = state
        .import_lock
        .try_lock()
        .map_err(|_| ApiError::Conflict("Import already running".to_string()))?;

    match state
        .importer
        .import(&request.questions, request.created_by.as_deref())
        .await
    {
        Ok(report) => Ok(Json(report).into_response()),
        Err(e) => {
            let body = RejectedBatch {
                error: e.to_string(),
                success_count: 0,
                error_count: e.rejected_count(),
                errors: e.details(),
            };
            Ok((StatusCode::BAD_REQUEST, Json(body)).into_response())
        }
    }
}

/// Build import routes
pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/api/import-questions", post(import_questions))
        .route("/api/import-questions/validate", post(validate_questions))
}
