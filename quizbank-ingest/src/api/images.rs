//! Stored question image serving
//!
//! GET /api/images/:name

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::{
    error::{ApiError, ApiResult},
    services::media_resolver::{content_type_for, sanitize_name},
    AppState,
};

/// Stored names are never reused, so responses may be cached indefinitely
const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// GET /api/images/:name
pub async fn serve_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    let name = sanitize_name(&name)
        .ok_or_else(|| ApiError::BadRequest("Image name is empty".to_string()))?;

    let bytes = state
        .importer
        .media()
        .store()
        .read(&name)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Image {}", name)))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&name)),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        bytes,
    )
        .into_response())
}

/// Build image routes
pub fn image_routes() -> Router<AppState> {
    Router::new().route("/api/images/:name", get(serve_image))
}
