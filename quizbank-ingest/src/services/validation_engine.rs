//! Validation engine
//!
//! Applies every rule to every normalized record. Rules never short-circuit:
//! a record with three problems reports all three. Any error excludes the
//! record from `valid_questions`; warnings alone never do.

use crate::models::validation::row_number;
use crate::models::{
    AnswerKey, AnswerShape, NormalizedRecord, QuestionDraft, QuestionType, ValidatedQuestion,
    ValidationIssue, ValidationReport, KNOWN_LEVELS, KNOWN_SUBJECTS,
};

/// Recommended timer range in seconds
pub const TIMER_RANGE: std::ops::RangeInclusive<i64> = 10..=120;

/// Characters of question text quoted in each issue
const PREVIEW_CHARS: usize = 30;

/// Validate a whole batch of normalized records
pub fn validate_batch(records: &[NormalizedRecord]) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (index, record) in records.iter().enumerate() {
        let row = row_number(index);
        let mut ctx = RowContext::new(row, record);

        ctx.check_common_fields();
        let question_type = record.question_type.parse::<QuestionType>().ok();
        if let Some(question_type) = question_type {
            ctx.check_answer(question_type);
        }
        ctx.check_timer();
        ctx.check_image_url();

        let RowContext { errors, warnings, .. } = ctx;
        let has_error = !errors.is_empty();
        report.errors.extend(errors);
        report.warnings.extend(warnings);

        match (has_error, question_type, record.level) {
            (false, Some(question_type), Some(level)) => {
                report.valid_questions.push(ValidatedQuestion {
                    row,
                    record: record.clone(),
                    draft: build_draft(record, question_type, level),
                });
            }
            _ => report.skipped_count += 1,
        }
    }

    report.is_valid = report.errors.is_empty();

    tracing::debug!(
        records = records.len(),
        valid = report.valid_questions.len(),
        skipped = report.skipped_count,
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "Batch validated"
    );

    report
}

fn build_draft(record: &NormalizedRecord, question_type: QuestionType, level: i64) -> QuestionDraft {
    QuestionDraft {
        subject: record.subject.clone(),
        level,
        question_text: record.question_text.clone(),
        image_url: Some(record.image_url.clone()).filter(|u| !u.is_empty()),
        timer_seconds: record.timer,
        answer: AnswerKey::from_record(question_type, record),
    }
}

/// Issues collected for a single row
struct RowContext<'a> {
    row: usize,
    record: &'a NormalizedRecord,
    preview: String,
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl<'a> RowContext<'a> {
    fn new(row: usize, record: &'a NormalizedRecord) -> Self {
        Self {
            row,
            record,
            preview: record.preview(PREVIEW_CHARS),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn issue(&self, field: &str, message: String) -> ValidationIssue {
        ValidationIssue {
            row: self.row,
            field: field.to_string(),
            message,
            question: self.preview.clone(),
        }
    }

    fn error(&mut self, field: &str, message: String) {
        let issue = self.issue(field, message);
        self.errors.push(issue);
    }

    fn warning(&mut self, field: &str, message: String) {
        let issue = self.issue(field, message);
        self.warnings.push(issue);
    }

    fn check_common_fields(&mut self) {
        let record = self.record;

        if record.subject.is_empty() {
            self.error(
                "subject",
                "Subject field is empty. You must specify a subject. This field cannot be left blank."
                    .to_string(),
            );
        } else if !KNOWN_SUBJECTS.contains(&record.subject.as_str()) {
            self.error(
                "subject",
                format!(
                    "Subject \"{}\" is not recognized. Please use one of these valid subjects: {}.",
                    record.subject,
                    KNOWN_SUBJECTS.join(", ")
                ),
            );
        }

        if !record.level.is_some_and(|l| KNOWN_LEVELS.contains(&l)) {
            let shown = record.level.map(|l| l.to_string()).unwrap_or_default();
            self.error(
                "level",
                format!(
                    "Level \"{}\" is invalid. Difficulty level must be 1 (Easy), 2 (Medium), or 3 (Hard).",
                    shown
                ),
            );
        }

        if record.question_type.is_empty() {
            self.error(
                "type",
                "Question Type field is empty. You must specify the type of question (mcq, matching, fill, reorder, or truefalse)."
                    .to_string(),
            );
        } else if record.question_type.parse::<QuestionType>().is_err() {
            let known: Vec<&str> = QuestionType::ALL.iter().map(|t| t.as_str()).collect();
            self.error(
                "type",
                format!(
                    "Question type \"{}\" is not recognized. Use one of these types: {}.",
                    record.question_type,
                    known.join(", ")
                ),
            );
        }

        if record.question_text.is_empty() {
            self.error(
                "question",
                "Question text field is empty. You must provide the actual question that students will answer."
                    .to_string(),
            );
        }
    }

    fn check_answer(&mut self, question_type: QuestionType) {
        let record = self.record;
        let answer = AnswerKey::from_record(question_type, record);

        match question_type {
            QuestionType::Mcq => {
                for (letter, option) in ["A", "B", "C", "D"].iter().zip(record.options()) {
                    if option.is_empty() {
                        self.error(
                            &format!("option{}", letter),
                            format!(
                                "Option {} is missing. Multiple Choice questions require all four options (A, B, C, D).",
                                letter
                            ),
                        );
                    }
                }

                if record.correct_answer.is_empty() {
                    self.error(
                        "correctAnswer",
                        "Correct Answer field is empty. You must specify which option is the correct answer for this MCQ."
                            .to_string(),
                    );
                } else if !record.options().contains(&record.correct_answer.as_str()) {
                    self.error(
                        "correctAnswer",
                        format!(
                            "Correct Answer \"{}\" does not match any option. The correct answer text must exactly match one of the four options.",
                            record.correct_answer
                        ),
                    );
                } else {
                    // Exactly one option may be stored as correct
                    let matches = record
                        .options()
                        .iter()
                        .filter(|o| **o == record.correct_answer)
                        .count();
                    if matches > 1 {
                        self.error(
                            "correctAnswer",
                            format!(
                                "Correct Answer \"{}\" matches {} options. Each option must be distinct so exactly one of them is correct.",
                                record.correct_answer, matches
                            ),
                        );
                    }
                }
            }
            QuestionType::Matching => {
                if answer.is_short() {
                    self.error(
                        "matching pairs",
                        format!(
                            "Only {} complete pair(s) found. Matching questions require at least {} complete pairs (with both left and right items).",
                            answer.populated_field_count() / 2,
                            answer.required_field_count() / 2
                        ),
                    );
                }

                for (i, (left, right)) in record.pair_slots().iter().enumerate() {
                    if left.is_empty() != right.is_empty() {
                        let n = i + 1;
                        self.warning(
                            &format!("pair {}", n),
                            format!(
                                "Pair {} is incomplete: either the left item or right item is missing. Both sides must have values to create a complete matching pair.",
                                n
                            ),
                        );
                    }
                }
            }
            QuestionType::Fill => {
                if answer.is_short() {
                    self.error(
                        "answer",
                        "Answer field is empty. You must provide the word or phrase that fills the blank."
                            .to_string(),
                    );
                }
                if !record.question_text.is_empty() && !record.question_text.contains('_') {
                    self.warning(
                        "question",
                        "Question is missing a blank marker. Fill in the Blanks questions should contain underscores (_______) where the missing word goes."
                            .to_string(),
                    );
                }
            }
            QuestionType::Reorder => {
                if answer.is_short() {
                    self.error(
                        "steps",
                        format!(
                            "Only {} step(s) found. Reorder questions require at least {} steps for students to arrange.",
                            answer.populated_field_count(),
                            answer.required_field_count()
                        ),
                    );
                }
            }
            QuestionType::TrueFalse => {
                let flag = record.is_true.to_lowercase();
                if flag != "true" && flag != "false" {
                    self.error(
                        "isTrue",
                        format!(
                            "The isTrue field contains \"{}\", which is invalid. For True/False questions, this field must contain either \"True\" or \"False\" (case-insensitive).",
                            record.is_true
                        ),
                    );
                }
            }
        }
    }

    // Out-of-range timers are imported as given
    fn check_timer(&mut self) {
        let timer = self.record.timer;
        if !TIMER_RANGE.contains(&timer) {
            self.warning(
                "timer",
                format!(
                    "Timer {}s seems unusual (recommended: {}-{} seconds)",
                    timer,
                    TIMER_RANGE.start(),
                    TIMER_RANGE.end()
                ),
            );
        }
    }

    fn check_image_url(&mut self) {
        let url = &self.record.image_url;
        if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
            self.warning(
                "imageUrl",
                "Image URL should start with http:// or https://".to_string(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(question_type: &str) -> NormalizedRecord {
        NormalizedRecord {
            subject: "history".to_string(),
            level: Some(1),
            question_type: question_type.to_string(),
            question_text: "Question ____".to_string(),
            timer: 30,
            ..Default::default()
        }
    }

    fn mcq() -> NormalizedRecord {
        let mut r = base("mcq");
        r.option_a = "A".to_string();
        r.option_b = "B".to_string();
        r.option_c = "C".to_string();
        r.option_d = "D".to_string();
        r.correct_answer = "B".to_string();
        r
    }

    fn fields(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.field.as_str()).collect()
    }

    #[test]
    fn test_valid_mcq_passes() {
        let report = validate_batch(&[mcq()]);
        assert!(report.is_valid);
        assert!(report.warnings.is_empty());
        assert_eq!(report.valid_questions.len(), 1);
        assert_eq!(report.valid_questions[0].row, 2);
        assert_eq!(report.skipped_count, 0);
    }

    #[test]
    fn test_all_rules_run_without_short_circuit() {
        let mut r = mcq();
        r.subject = String::new();
        r.level = Some(7);
        r.option_c = String::new();
        r.correct_answer = "Z".to_string();
        r.timer = 500;

        let report = validate_batch(&[r]);
        assert_eq!(fields(&report.errors), vec!["subject", "level", "optionC", "correctAnswer"]);
        assert_eq!(fields(&report.warnings), vec!["timer"]);
        assert_eq!(report.skipped_count, 1);
        assert!(report.valid_questions.is_empty());
    }

    #[test]
    fn test_unknown_type_skips_answer_rules() {
        let report = validate_batch(&[base("essay")]);
        assert_eq!(fields(&report.errors), vec!["type"]);
    }

    #[test]
    fn test_subject_is_case_insensitive_after_normalization() {
        let mut r = mcq();
        r.subject = "geography".to_string();
        assert!(validate_batch(&[r]).is_valid);

        let mut r = mcq();
        r.subject = "culture".to_string();
        let report = validate_batch(&[r]);
        assert!(report.errors[0].message.contains("history, geography, combined"));
    }

    #[test]
    fn test_mcq_correct_answer_must_be_unique() {
        let mut r = mcq();
        r.option_c = "B".to_string();

        let report = validate_batch(&[r]);
        assert_eq!(fields(&report.errors), vec!["correctAnswer"]);
        assert!(report.errors[0].message.contains("matches 2 options"));
        assert!(report.valid_questions.is_empty());

        // Duplicate wrong options leave a single correct one
        let mut r = mcq();
        r.option_c = "A".to_string();
        assert!(validate_batch(&[r]).is_valid);
    }

    #[test]
    fn test_mcq_correct_answer_is_exact_match() {
        let mut r = mcq();
        r.correct_answer = "b".to_string();
        let report = validate_batch(&[r]);
        assert_eq!(fields(&report.errors), vec!["correctAnswer"]);
    }

    #[test]
    fn test_matching_incomplete_pair_is_warning() {
        let mut r = base("matching");
        r.left_item1 = "L1".to_string();
        r.right_item1 = "R1".to_string();
        r.left_item2 = "L2".to_string();
        r.right_item2 = "R2".to_string();
        r.left_item3 = "L3".to_string();

        let report = validate_batch(&[r]);
        assert!(report.errors.is_empty());
        assert_eq!(fields(&report.warnings), vec!["pair 3"]);
        assert_eq!(report.valid_questions.len(), 1);
    }

    #[test]
    fn test_matching_needs_two_pairs() {
        let mut r = base("matching");
        r.left_item1 = "L1".to_string();
        r.right_item1 = "R1".to_string();
        r.right_item2 = "R2".to_string();

        let report = validate_batch(&[r]);
        assert_eq!(fields(&report.errors), vec!["matching pairs"]);
        assert!(report.errors[0].message.starts_with("Only 1 complete pair(s) found"));
        assert_eq!(fields(&report.warnings), vec!["pair 2"]);
    }

    #[test]
    fn test_fill_without_blank_is_warning() {
        let mut r = base("fill");
        r.question_text = "The capital of Mauritius is".to_string();
        r.answer = "Port Louis".to_string();

        let report = validate_batch(&[r]);
        assert!(report.errors.is_empty());
        assert_eq!(fields(&report.warnings), vec!["question"]);
        assert_eq!(report.valid_questions.len(), 1);
    }

    #[test]
    fn test_fill_requires_answer() {
        let report = validate_batch(&[base("fill")]);
        assert_eq!(fields(&report.errors), vec!["answer"]);
    }

    #[test]
    fn test_reorder_needs_two_steps() {
        let mut r = base("reorder");
        r.step1 = "Only step".to_string();

        let report = validate_batch(&[r]);
        assert_eq!(fields(&report.errors), vec!["steps"]);
        assert!(report.errors[0].message.starts_with("Only 1 step(s) found"));
    }

    #[test]
    fn test_truefalse_flag() {
        for (flag, ok) in [("True", true), ("FALSE", true), ("Maybe", false), ("", false)] {
            let mut r = base("truefalse");
            r.is_true = flag.to_string();
            assert_eq!(validate_batch(&[r]).is_valid, ok, "isTrue = {:?}", flag);
        }
    }

    #[test]
    fn test_timer_and_image_warnings_do_not_block() {
        let mut r = mcq();
        r.timer = 5;
        r.image_url = "images/map.png".to_string();

        let report = validate_batch(&[r]);
        assert!(report.is_valid);
        assert_eq!(fields(&report.warnings), vec!["timer", "imageUrl"]);
        assert_eq!(report.valid_questions[0].draft.timer_seconds, 5);
        assert_eq!(
            report.valid_questions[0].draft.image_url.as_deref(),
            Some("images/map.png")
        );
    }

    #[test]
    fn test_rows_stay_in_range() {
        let mut bad = mcq();
        bad.question_text = String::new();
        let records = vec![mcq(), bad.clone(), mcq(), bad];

        let report = validate_batch(&records);
        for issue in report.errors.iter().chain(report.warnings.iter()) {
            assert!((2..=records.len() + 1).contains(&issue.row));
        }
        assert_eq!(report.error_rows(), vec![3, 5]);
        let valid_rows: Vec<usize> = report.valid_questions.iter().map(|q| q.row).collect();
        assert_eq!(valid_rows, vec![2, 4]);
        assert_eq!(report.skipped_count, 2);
    }

    #[test]
    fn test_error_iff_excluded() {
        let mut warn_only = mcq();
        warn_only.timer = 200;
        let mut broken = base("reorder");
        broken.step1 = "x".to_string();

        let records = vec![warn_only, broken, mcq()];
        let report = validate_batch(&records);
        let error_rows = report.error_rows();
        for (i, _) in records.iter().enumerate() {
            let row = row_number(i);
            let included = report.valid_questions.iter().any(|q| q.row == row);
            assert_eq!(error_rows.contains(&row), !included, "row {}", row);
        }
    }
}
