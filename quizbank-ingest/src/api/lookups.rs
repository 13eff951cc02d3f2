//! Lookup listing endpoints

use axum::{extract::State, routing::get, Json, Router};

use crate::{
    db::lookups::{self, Level, QuestionTypeRow, Subject},
    error::ApiResult,
    AppState,
};

/// GET /api/subjects
pub async fn list_subjects(State(state): State<AppState>) -> ApiResult<Json<Vec<Subject>>> {
    Ok(Json(lookups::list_subjects(&state.db).await?))
}

/// GET /api/levels
pub async fn list_levels(State(state): State<AppState>) -> ApiResult<Json<Vec<Level>>> {
    Ok(Json(lookups::list_levels(&state.db).await?))
}

/// GET /api/question-types
pub async fn list_question_types(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<QuestionTypeRow>>> {
    Ok(Json(lookups::list_question_types(&state.db).await?))
}

/// Build lookup routes
pub fn lookup_routes() -> Router<AppState> {
    Router::new()
        .route("/api/subjects", get(list_subjects))
        .route("/api/levels", get(list_levels))
        .route("/api/question-types", get(list_question_types))
}
