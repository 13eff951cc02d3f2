//! Question shapes
//!
//! A question carries exactly one answer key, and the variant of that key
//! decides which satellite table receives its rows. Building the key from a
//! validated record is the only place the per-type columns are read.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::record::NormalizedRecord;

/// Subjects accepted by validation
pub const KNOWN_SUBJECTS: &[&str] = &["history", "geography", "combined"];

/// Levels accepted by validation
pub const KNOWN_LEVELS: &[i64] = &[1, 2, 3];

/// Question type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Mcq,
    Matching,
    Fill,
    Reorder,
    TrueFalse,
}

impl QuestionType {
    pub const ALL: [QuestionType; 5] = [
        QuestionType::Mcq,
        QuestionType::Matching,
        QuestionType::Fill,
        QuestionType::Reorder,
        QuestionType::TrueFalse,
    ];

    /// Tag as stored in `question_types.name`
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "mcq",
            QuestionType::Matching => "matching",
            QuestionType::Fill => "fill",
            QuestionType::Reorder => "reorder",
            QuestionType::TrueFalse => "truefalse",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        QuestionType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| format!("Unknown question type: {}", s))
    }
}

/// One row destined for a satellite table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SatelliteRow {
    McqOption {
        order: i64,
        text: String,
        is_correct: bool,
    },
    MatchingPair {
        order: i64,
        left: String,
        right: String,
    },
    FillAnswer {
        answer: String,
        case_sensitive: bool,
    },
    ReorderItem {
        order: i64,
        text: String,
        correct_position: i64,
    },
    TrueFalse {
        correct: bool,
        explanation: Option<String>,
    },
}

/// Per-variant behavior shared by every answer shape
pub trait AnswerShape {
    /// Minimum number of answer cells a record of this shape must fill
    fn required_field_count(&self) -> usize;

    /// Answer cells this instance actually carries
    fn populated_field_count(&self) -> usize;

    /// Rows to insert into the variant's satellite table
    fn to_satellite_rows(&self) -> Vec<SatelliteRow>;
}

/// Four options, one of which equals the declared correct answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct McqAnswer {
    pub options: [String; 4],
    pub correct: String,
}

impl AnswerShape for McqAnswer {
    fn required_field_count(&self) -> usize {
        5
    }

    fn populated_field_count(&self) -> usize {
        self.options.iter().filter(|o| !o.is_empty()).count() + usize::from(!self.correct.is_empty())
    }

    fn to_satellite_rows(&self) -> Vec<SatelliteRow> {
        self.options
            .iter()
            .enumerate()
            .map(|(i, text)| SatelliteRow::McqOption {
                order: i as i64 + 1,
                text: text.clone(),
                is_correct: *text == self.correct,
            })
            .collect()
    }
}

/// Complete left/right pairs in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchingAnswer {
    pub pairs: Vec<(String, String)>,
}

impl MatchingAnswer {
    pub const MIN_PAIRS: usize = 2;
}

impl AnswerShape for MatchingAnswer {
    fn required_field_count(&self) -> usize {
        Self::MIN_PAIRS * 2
    }

    fn populated_field_count(&self) -> usize {
        self.pairs.len() * 2
    }

    fn to_satellite_rows(&self) -> Vec<SatelliteRow> {
        self.pairs
            .iter()
            .enumerate()
            .map(|(i, (left, right))| SatelliteRow::MatchingPair {
                order: i as i64 + 1,
                left: left.clone(),
                right: right.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillAnswer {
    pub answer: String,
}

impl AnswerShape for FillAnswer {
    fn required_field_count(&self) -> usize {
        1
    }

    fn populated_field_count(&self) -> usize {
        usize::from(!self.answer.is_empty())
    }

    fn to_satellite_rows(&self) -> Vec<SatelliteRow> {
        vec![SatelliteRow::FillAnswer {
            answer: self.answer.clone(),
            case_sensitive: false,
        }]
    }
}

/// Steps in their correct order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReorderAnswer {
    pub steps: Vec<String>,
}

impl ReorderAnswer {
    pub const MIN_STEPS: usize = 2;
}

impl AnswerShape for ReorderAnswer {
    fn required_field_count(&self) -> usize {
        Self::MIN_STEPS
    }

    fn populated_field_count(&self) -> usize {
        self.steps.len()
    }

    // Input order is the answer key; shuffling happens at play time
    fn to_satellite_rows(&self) -> Vec<SatelliteRow> {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, text)| SatelliteRow::ReorderItem {
                order: i as i64 + 1,
                text: text.clone(),
                correct_position: i as i64 + 1,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrueFalseAnswer {
    pub answer: bool,
}

impl AnswerShape for TrueFalseAnswer {
    fn required_field_count(&self) -> usize {
        1
    }

    fn populated_field_count(&self) -> usize {
        1
    }

    fn to_satellite_rows(&self) -> Vec<SatelliteRow> {
        vec![SatelliteRow::TrueFalse {
            correct: self.answer,
            explanation: None,
        }]
    }
}

/// Answer key: one variant per question type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnswerKey {
    Mcq(McqAnswer),
    Matching(MatchingAnswer),
    Fill(FillAnswer),
    Reorder(ReorderAnswer),
    TrueFalse(TrueFalseAnswer),
}

impl AnswerKey {
    /// Build the answer key for `question_type` from a normalized record
    ///
    /// Blank matching pairs and reorder steps are dropped, so stored orders
    /// are always compacted to 1..N. Callers decide whether the result meets
    /// the shape's minimums.
    pub fn from_record(question_type: QuestionType, record: &NormalizedRecord) -> Self {
        match question_type {
            QuestionType::Mcq => AnswerKey::Mcq(McqAnswer {
                options: record.options().map(str::to_string),
                correct: record.correct_answer.clone(),
            }),
            QuestionType::Matching => AnswerKey::Matching(MatchingAnswer {
                pairs: record
                    .pair_slots()
                    .iter()
                    .filter(|(left, right)| !left.is_empty() && !right.is_empty())
                    .map(|(left, right)| (left.to_string(), right.to_string()))
                    .collect(),
            }),
            QuestionType::Fill => AnswerKey::Fill(FillAnswer {
                answer: record.answer.clone(),
            }),
            QuestionType::Reorder => AnswerKey::Reorder(ReorderAnswer {
                steps: record
                    .step_slots()
                    .iter()
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .collect(),
            }),
            QuestionType::TrueFalse => AnswerKey::TrueFalse(TrueFalseAnswer {
                answer: record.is_true.eq_ignore_ascii_case("true"),
            }),
        }
    }

    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerKey::Mcq(_) => QuestionType::Mcq,
            AnswerKey::Matching(_) => QuestionType::Matching,
            AnswerKey::Fill(_) => QuestionType::Fill,
            AnswerKey::Reorder(_) => QuestionType::Reorder,
            AnswerKey::TrueFalse(_) => QuestionType::TrueFalse,
        }
    }

    fn shape(&self) -> &dyn AnswerShape {
        match self {
            AnswerKey::Mcq(a) => a,
            AnswerKey::Matching(a) => a,
            AnswerKey::Fill(a) => a,
            AnswerKey::Reorder(a) => a,
            AnswerKey::TrueFalse(a) => a,
        }
    }

    /// True when the key carries fewer answer cells than its shape requires
    pub fn is_short(&self) -> bool {
        self.populated_field_count() < self.required_field_count()
    }
}

impl AnswerShape for AnswerKey {
    fn required_field_count(&self) -> usize {
        self.shape().required_field_count()
    }

    fn populated_field_count(&self) -> usize {
        self.shape().populated_field_count()
    }

    fn to_satellite_rows(&self) -> Vec<SatelliteRow> {
        self.shape().to_satellite_rows()
    }
}

/// A fully validated question, ready for media resolution and persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionDraft {
    pub subject: String,
    pub level: i64,
    pub question_text: String,
    /// Image reference as given; replaced by the resolved reference at import
    pub image_url: Option<String>,
    pub timer_seconds: i64,
    pub answer: AnswerKey,
}

impl QuestionDraft {
    pub fn question_type(&self) -> QuestionType {
        self.answer.question_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(question_type: &str) -> NormalizedRecord {
        NormalizedRecord {
            subject: "history".to_string(),
            level: Some(1),
            question_type: question_type.to_string(),
            question_text: "Q".to_string(),
            timer: 30,
            ..Default::default()
        }
    }

    #[test]
    fn test_question_type_parse() {
        assert_eq!("MCQ".parse::<QuestionType>().unwrap(), QuestionType::Mcq);
        assert_eq!(" TrueFalse ".parse::<QuestionType>().unwrap(), QuestionType::TrueFalse);
        assert!("essay".parse::<QuestionType>().is_err());
        assert_eq!(QuestionType::TrueFalse.to_string(), "truefalse");
    }

    #[test]
    fn test_mcq_rows_mark_exact_match_only() {
        let mut r = record("mcq");
        r.option_a = "1810".to_string();
        r.option_b = "1968".to_string();
        r.option_c = "1992".to_string();
        r.option_d = "1715".to_string();
        r.correct_answer = "1968".to_string();

        let rows = AnswerKey::from_record(QuestionType::Mcq, &r).to_satellite_rows();
        assert_eq!(rows.len(), 4);
        let correct: Vec<i64> = rows
            .iter()
            .filter_map(|row| match row {
                SatelliteRow::McqOption { order, is_correct: true, .. } => Some(*order),
                _ => None,
            })
            .collect();
        assert_eq!(correct, vec![2]);
    }

    #[test]
    fn test_matching_skips_incomplete_pairs() {
        let mut r = record("matching");
        r.left_item1 = "Port Louis".to_string();
        r.right_item1 = "Capital".to_string();
        r.left_item2 = "Le Morne".to_string();
        r.right_item2 = "Mountain".to_string();
        r.left_item3 = "Chamarel".to_string();

        let key = AnswerKey::from_record(QuestionType::Matching, &r);
        assert!(!key.is_short());
        let rows = key.to_satellite_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1],
            SatelliteRow::MatchingPair {
                order: 2,
                left: "Le Morne".to_string(),
                right: "Mountain".to_string()
            }
        );
    }

    #[test]
    fn test_reorder_positions_are_compacted() {
        let mut r = record("reorder");
        r.step1 = "Dutch".to_string();
        r.step3 = "French".to_string();
        r.step4 = "British".to_string();

        let rows = AnswerKey::from_record(QuestionType::Reorder, &r).to_satellite_rows();
        let positions: Vec<i64> = rows
            .iter()
            .filter_map(|row| match row {
                SatelliteRow::ReorderItem { correct_position, .. } => Some(*correct_position),
                _ => None,
            })
            .collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn test_short_reorder_detected() {
        let mut r = record("reorder");
        r.step2 = "Only".to_string();
        let key = AnswerKey::from_record(QuestionType::Reorder, &r);
        assert!(key.is_short());
        assert_eq!(key.populated_field_count(), 1);
    }

    #[test]
    fn test_truefalse_parse_is_case_insensitive() {
        let mut r = record("truefalse");
        r.is_true = "TRUE".to_string();
        assert_eq!(
            AnswerKey::from_record(QuestionType::TrueFalse, &r).to_satellite_rows(),
            vec![SatelliteRow::TrueFalse { correct: true, explanation: None }]
        );
    }
}
