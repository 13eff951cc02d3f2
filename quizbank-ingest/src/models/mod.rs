//! Data models for quizbank-ingest
//!
//! - Raw and normalized records
//! - Typed question shapes and their satellite rows
//! - Validation results, batch state machine, import report

pub mod import_result;
pub mod import_session;
pub mod question;
pub mod record;
pub mod validation;

pub use import_result::{ContentOwner, ImportReport, RejectedBatch};
pub use import_session::{BatchSession, BatchState, StateTransition};
pub use question::{
    AnswerKey, AnswerShape, FillAnswer, MatchingAnswer, McqAnswer, QuestionDraft, QuestionType,
    ReorderAnswer, SatelliteRow, TrueFalseAnswer, KNOWN_LEVELS, KNOWN_SUBJECTS,
};
pub use record::{NormalizedRecord, RawRecord, DEFAULT_TIMER_SECONDS};
pub use validation::{ValidatedQuestion, ValidationIssue, ValidationReport, ROW_OFFSET};
