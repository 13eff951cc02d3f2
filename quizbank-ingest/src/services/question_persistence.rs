//! Question persistence engine
//!
//! Resolves lookup keys and writes one question with its satellite rows.
//! Everything for a record happens in a single transaction: either the
//! parent row and all satellite rows are stored, or nothing is.

use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::lookups::{find_level_id, find_question_type_id, find_subject_id};
use crate::db::questions::{insert_question, insert_satellite_row, NewQuestion};
use crate::models::{AnswerShape, ContentOwner, QuestionDraft};
use crate::utils::begin_monitored;

/// Per-record persistence failure
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    #[error("Level not found: {0}")]
    LevelNotFound(i64),

    #[error("Question type not found: {0}")]
    QuestionTypeNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Common(#[from] quizbank_common::Error),
}

/// Persist one validated question
///
/// `image_url` is the already-resolved reference. Returns the new question id.
pub async fn persist_question(
    pool: &SqlitePool,
    draft: &QuestionDraft,
    image_url: Option<&str>,
    created_by: ContentOwner,
) -> Result<i64, PersistError> {
    let question_type = draft.question_type();
    let mut tx = begin_monitored(pool, "question_persistence::persist_question").await?;

    let subject_id = find_subject_id(tx.conn()?, &draft.subject)
        .await?
        .ok_or_else(|| PersistError::SubjectNotFound(draft.subject.clone()))?;

    let level_id = find_level_id(tx.conn()?, draft.level)
        .await?
        .ok_or(PersistError::LevelNotFound(draft.level))?;

    let question_type_id = find_question_type_id(tx.conn()?, question_type.as_str())
        .await?
        .ok_or_else(|| PersistError::QuestionTypeNotFound(question_type.to_string()))?;

    let question_id = insert_question(
        tx.conn()?,
        &NewQuestion {
            subject_id,
            level_id,
            question_type_id,
            question_text: &draft.question_text,
            image_url,
            timer_seconds: draft.timer_seconds,
            created_by: created_by.as_str(),
        },
    )
    .await?;

    let rows = draft.answer.to_satellite_rows();
    for row in &rows {
        insert_satellite_row(tx.conn()?, question_id, row).await?;
    }

    tx.commit().await?;

    tracing::debug!(
        question_id,
        question_type = %question_type,
        satellite_rows = rows.len(),
        "Question persisted"
    );

    Ok(question_id)
}
