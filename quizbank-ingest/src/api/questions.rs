//! Question bank endpoints
//!
//! GET /api/questions, POST /api/questions, DELETE /api/questions/:id

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::questions::{self, QuestionDetail, QuestionFilter},
    error::{ApiError, ApiResult},
    models::RawRecord,
    services::{EntryError, PersistError},
    AppState,
};

/// GET /api/questions query; `all` or blank means no filter
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub subject: Option<String>,
    pub level: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<String>,
}

fn active(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

impl ListQuery {
    fn into_filter(self) -> ApiResult<QuestionFilter> {
        let level = match active(self.level) {
            Some(level) => Some(
                level
                    .parse::<i64>()
                    .map_err(|_| ApiError::BadRequest(format!("Invalid level: {}", level)))?,
            ),
            None => None,
        };

        Ok(QuestionFilter {
            subject: active(self.subject),
            level,
            question_type: active(self.question_type).map(|t| t.to_lowercase()),
        })
    }
}

/// POST /api/questions request: one raw record plus its owner tag
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub created_by: Option<String>,
    #[serde(flatten)]
    pub record: RawRecord,
}

#[derive(Debug, Serialize)]
pub struct CreateQuestionResponse {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteQuestionResponse {
    pub id: i64,
    pub deleted: bool,
}

/// GET /api/questions
pub async fn list_questions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<QuestionDetail>>> {
    let filter = query.into_filter()?;
    Ok(Json(questions::list_questions(&state.db, &filter).await?))
}

/// POST /api/questions
///
/// Manual entry through the same normalize → validate → media → persist path
/// as batch import.
pub async fn create_question(
    State(state): State<AppState>,
    payload: Result<Json<CreateQuestionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateQuestionResponse>)> {
    let Json(request) = payload?;
    let id = state
        .importer
        .import_one(&request.record, request.created_by.as_deref())
        .await
        .map_err(|e| match e {
            EntryError::InvalidContentOwner(_) => ApiError::BadRequest(e.to_string()),
            EntryError::Invalid(issues) => ApiError::Validation(issues),
            EntryError::Persist(PersistError::Database(err)) => ApiError::Database(err),
            EntryError::Persist(PersistError::Common(err)) => ApiError::Common(err),
            EntryError::Persist(err) => ApiError::BadRequest(err.to_string()),
        })?;

    Ok((StatusCode::CREATED, Json(CreateQuestionResponse { id })))
}

/// DELETE /api/questions/:id
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteQuestionResponse>> {
    if !questions::delete_question(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("Question {}", id)));
    }

    tracing::info!(question_id = id, "Question deleted");
    Ok(Json(DeleteQuestionResponse { id, deleted: true }))
}

/// Build question routes
pub fn question_routes() -> Router<AppState> {
    Router::new()
        .route("/api/questions", get(list_questions).post(create_question))
        .route("/api/questions/:id", delete(delete_question))
}
