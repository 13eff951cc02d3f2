//! Batch import orchestrator
//!
//! Drives a batch through normalize → validate → (media → persist) per valid
//! record, strictly one record at a time. Only an empty batch or an invalid
//! content-owner tag stops a batch; every per-record failure is counted and
//! the loop moves on.

use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{
    BatchSession, BatchState, ContentOwner, ImportReport, RawRecord, ValidationIssue,
    ValidationReport,
};
use crate::services::media_resolver::MediaResolver;
use crate::services::question_persistence::{persist_question, PersistError};
use crate::services::record_normalizer::{normalize, normalize_all};
use crate::services::validation_engine::validate_batch;

/// Characters of question text quoted in failure messages
const FAILURE_PREVIEW_CHARS: usize = 30;

/// Conditions that reject a whole batch before any record is processed
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("No questions provided")]
    EmptyBatch,

    #[error("Invalid createdBy value: \"{tag}\". Must be \"MES\" or \"MIE\"")]
    InvalidContentOwner { tag: String, total: usize },
}

impl BatchError {
    /// Records counted as failed in the rejection report
    pub fn rejected_count(&self) -> usize {
        match self {
            BatchError::EmptyBatch => 0,
            BatchError::InvalidContentOwner { total, .. } => *total,
        }
    }

    /// Detail lines for the rejection report
    pub fn details(&self) -> Vec<String> {
        match self {
            BatchError::EmptyBatch => vec!["The import batch contains no records.".to_string()],
            BatchError::InvalidContentOwner { tag, .. } => vec![format!(
                "Invalid createdBy: \"{}\". This field must be \"MES\" (Mauritius Education System) or \"MIE\" (Mauritius Institute of Education).",
                tag
            )],
        }
    }
}

/// Failure of a single manually entered question
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("Invalid createdBy value: \"{0}\". Must be \"MES\" or \"MIE\"")]
    InvalidContentOwner(String),

    #[error("Question failed validation with {} error(s)", .0.len())]
    Invalid(Vec<ValidationIssue>),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Runs validation and imports against one database and media resolver
#[derive(Clone)]
pub struct BatchImporter {
    db: SqlitePool,
    media: Arc<MediaResolver>,
    max_report_errors: usize,
}

impl BatchImporter {
    pub fn new(db: SqlitePool, media: Arc<MediaResolver>, max_report_errors: usize) -> Self {
        Self {
            db,
            media,
            max_report_errors,
        }
    }

    pub fn media(&self) -> &Arc<MediaResolver> {
        &self.media
    }

    /// Normalize and validate without persisting anything
    pub fn validate(&self, raws: &[RawRecord]) -> ValidationReport {
        validate_batch(&normalize_all(raws))
    }

    /// Import a batch and report the outcome
    pub async fn import(
        &self,
        raws: &[RawRecord],
        created_by: Option<&str>,
    ) -> Result<ImportReport, BatchError> {
        if raws.is_empty() {
            tracing::warn!("Import rejected: empty batch");
            return Err(BatchError::EmptyBatch);
        }

        let owner = ContentOwner::parse(created_by).map_err(|tag| {
            tracing::warn!(created_by = %tag, records = raws.len(), "Import rejected: invalid content owner");
            BatchError::InvalidContentOwner {
                tag,
                total: raws.len(),
            }
        })?;

        let mut session = BatchSession::new(owner, raws.len(), self.max_report_errors);
        tracing::info!(
            batch_id = %session.batch_id,
            records = raws.len(),
            created_by = %owner,
            "Batch import started"
        );

        session.transition_to(BatchState::Validating);
        let validation = self.validate(raws);

        if validation.valid_questions.is_empty() {
            tracing::info!(
                batch_id = %session.batch_id,
                skipped = validation.skipped_count,
                "No valid records in batch, nothing to persist"
            );
            session.transition_to(BatchState::Reported);
            return Ok(build_report(&session, validation));
        }

        session.transition_to(BatchState::Persisting);
        for question in &validation.valid_questions {
            let image_url = self.media.resolve(question.draft.image_url.as_deref()).await;

            match persist_question(&self.db, &question.draft, image_url.as_deref(), owner).await {
                Ok(question_id) => {
                    tracing::debug!(
                        batch_id = %session.batch_id,
                        row = question.row,
                        question_id,
                        "Record imported"
                    );
                    session.record_success();
                }
                Err(e) => {
                    tracing::warn!(
                        batch_id = %session.batch_id,
                        row = question.row,
                        error = %e,
                        "Record failed to import"
                    );
                    if let Some(stored) = image_url.as_deref() {
                        self.media.discard(question.draft.image_url.as_deref(), stored).await;
                    }
                    session.record_failure(format!(
                        "Failed to import \"{}...\": {}",
                        question.record.preview(FAILURE_PREVIEW_CHARS),
                        e
                    ));
                }
            }
        }

        session.transition_to(BatchState::Reported);
        Ok(build_report(&session, validation))
    }

    /// Import one manually entered question through the same pipeline
    pub async fn import_one(
        &self,
        raw: &RawRecord,
        created_by: Option<&str>,
    ) -> Result<i64, EntryError> {
        let owner = ContentOwner::parse(created_by).map_err(EntryError::InvalidContentOwner)?;

        let report = validate_batch(&[normalize(raw)]);
        let question = match report.valid_questions.into_iter().next() {
            Some(question) => question,
            None => return Err(EntryError::Invalid(report.errors)),
        };

        let image_url = self.media.resolve(question.draft.image_url.as_deref()).await;
        let id = match persist_question(&self.db, &question.draft, image_url.as_deref(), owner).await {
            Ok(id) => id,
            Err(e) => {
                if let Some(stored) = image_url.as_deref() {
                    self.media.discard(question.draft.image_url.as_deref(), stored).await;
                }
                return Err(e.into());
            }
        };

        tracing::info!(question_id = id, created_by = %owner, "Question created");
        Ok(id)
    }
}

fn build_report(session: &BatchSession, validation: ValidationReport) -> ImportReport {
    tracing::info!(
        batch_id = %session.batch_id,
        total = session.total_records,
        succeeded = session.success_count,
        failed = session.failure_count,
        skipped = validation.skipped_count,
        elapsed_ms = session.elapsed_ms(),
        "Batch import finished"
    );

    ImportReport {
        message: ImportReport::summary_message(session.success_count, session.failure_count),
        success_count: session.success_count,
        error_count: session.failure_count,
        errors: session.failures.clone(),
        total_intended: session.total_records,
        skipped_count: validation.skipped_count,
        validation_errors: validation.errors,
        validation_warnings: validation.warnings,
    }
}
