//! Validation results
//!
//! Errors exclude a record from import; warnings are surfaced but the record
//! still goes through.

use serde::Serialize;

use super::question::QuestionDraft;
use super::record::NormalizedRecord;

/// Offset from a zero-based record index to its spreadsheet row number
///
/// Row 1 holds the column headers, so the first record is row 2.
pub const ROW_OFFSET: usize = 2;

/// Spreadsheet row number for a zero-based record index
pub fn row_number(index: usize) -> usize {
    index + ROW_OFFSET
}

/// One error or warning, keyed by row and field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub row: usize,
    pub field: String,
    pub message: String,
    /// Question text preview, to help locate the row
    pub question: String,
}

/// A record that passed validation together with its typed draft
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedQuestion {
    pub row: usize,
    pub record: NormalizedRecord,
    #[serde(skip)]
    pub draft: QuestionDraft,
}

/// Outcome of validating a whole batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    #[serde(serialize_with = "serialize_records")]
    pub valid_questions: Vec<ValidatedQuestion>,
    pub skipped_count: usize,
}

impl ValidationReport {
    /// Rows (not issues) that carry at least one error
    pub fn error_rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self.errors.iter().map(|e| e.row).collect();
        rows.dedup();
        rows
    }
}

// validQuestions carries the plain records so they can be posted back for import
fn serialize_records<S>(questions: &[ValidatedQuestion], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(questions.iter().map(|q| &q.record))
}
