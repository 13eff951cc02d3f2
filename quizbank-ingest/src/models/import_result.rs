//! Import outcomes and the batch content-owner tag

use serde::{Deserialize, Serialize};
use std::fmt;

use super::validation::ValidationIssue;

/// Tag applied when a batch does not name its owner
pub const DEFAULT_CONTENT_OWNER: &str = "MES";

/// Team that authored a batch of questions
///
/// Only these two tags pass the import gate. The database also stores `MAI`,
/// which no import path assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentOwner {
    Mes,
    Mie,
}

impl ContentOwner {
    /// Parse a batch tag: trimmed, upper-cased, `MES` when omitted or empty
    ///
    /// A tag that is only whitespace is rejected. Returns the normalized tag
    /// text on rejection.
    pub fn parse(raw: Option<&str>) -> Result<Self, String> {
        let tag = match raw {
            None | Some("") => DEFAULT_CONTENT_OWNER.to_string(),
            Some(s) => s.trim().to_uppercase(),
        };

        match tag.as_str() {
            "MES" => Ok(ContentOwner::Mes),
            "MIE" => Ok(ContentOwner::Mie),
            _ => Err(tag),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentOwner::Mes => "MES",
            ContentOwner::Mie => "MIE",
        }
    }
}

impl fmt::Display for ContentOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final report of a batch import
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub message: String,
    pub success_count: usize,
    pub error_count: usize,
    /// First failure messages, capped
    pub errors: Vec<String>,
    pub total_intended: usize,
    pub skipped_count: usize,
    pub validation_errors: Vec<ValidationIssue>,
    pub validation_warnings: Vec<ValidationIssue>,
}

impl ImportReport {
    pub fn summary_message(success_count: usize, error_count: usize) -> String {
        format!(
            "Imported {} questions successfully. {} failed.",
            success_count, error_count
        )
    }
}

/// Body returned when a whole batch is rejected before any work
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedBatch {
    pub error: String,
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<String>,
}
