//! quizbank-ingest library interface
//!
//! Question-bank ingestion pipeline: normalize, validate, resolve media and
//! persist batches of quiz questions. Exposed as a library so the binary and
//! the integration tests share one router.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::services::{BatchImporter, MediaResolver};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Pipeline entry point for validation, batch import and manual entry
    pub importer: BatchImporter,
    /// Held for the duration of a batch import; one import at a time
    pub import_lock: Arc<Mutex<()>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, media: MediaResolver, max_report_errors: usize) -> Self {
        let importer = BatchImporter::new(db.clone(), Arc::new(media), max_report_errors);
        Self {
            db,
            importer,
            import_lock: Arc::new(Mutex::new(())),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::import_routes())
        .merge(api::question_routes())
        .merge(api::lookup_routes())
        .merge(api::image_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
