//! Record normalizer
//!
//! Pure conversion from a raw spreadsheet row to a [`NormalizedRecord`].
//! Runs on every row, valid or not, so validation can rely on string fields.

use crate::models::record::{cell_to_number, RawRecord, DEFAULT_TIMER_SECONDS};
use crate::models::NormalizedRecord;

/// Column names for each field, primary name first
mod columns {
    pub const SUBJECT: &[&str] = &["subject"];
    pub const LEVEL: &[&str] = &["level"];
    pub const TYPE: &[&str] = &["type"];
    pub const QUESTION: &[&str] = &["question", "question_text"];
    pub const IMAGE_URL: &[&str] = &["imageUrl", "image_url"];
    pub const TIMER: &[&str] = &["timer"];
}

/// Normalize one raw record
pub fn normalize(raw: &RawRecord) -> NormalizedRecord {
    let text = |column: &str| raw.text(&[column]);

    NormalizedRecord {
        subject: raw.text(columns::SUBJECT).to_lowercase(),
        level: raw.cell(columns::LEVEL).and_then(integral_number),
        question_type: raw.text(columns::TYPE).to_lowercase(),
        question_text: raw.text(columns::QUESTION),
        image_url: raw.text(columns::IMAGE_URL),
        timer: normalize_timer(raw),

        option_a: text("optionA"),
        option_b: text("optionB"),
        option_c: text("optionC"),
        option_d: text("optionD"),
        correct_answer: text("correctAnswer"),

        left_item1: text("leftItem1"),
        right_item1: text("rightItem1"),
        left_item2: text("leftItem2"),
        right_item2: text("rightItem2"),
        left_item3: text("leftItem3"),
        right_item3: text("rightItem3"),
        left_item4: text("leftItem4"),
        right_item4: text("rightItem4"),

        answer: text("answer"),

        step1: text("step1"),
        step2: text("step2"),
        step3: text("step3"),
        step4: text("step4"),

        is_true: text("isTrue"),
    }
}

/// Normalize a whole batch, preserving order
pub fn normalize_all(raws: &[RawRecord]) -> Vec<NormalizedRecord> {
    raws.iter().map(normalize).collect()
}

fn integral_number(value: &serde_json::Value) -> Option<i64> {
    cell_to_number(value)
        .filter(|f| f.fract() == 0.0)
        .map(|f| f as i64)
}

// Blank, zero and non-numeric timers fall back to the default
fn normalize_timer(raw: &RawRecord) -> i64 {
    match raw.cell(columns::TIMER).and_then(cell_to_number) {
        Some(seconds) if seconds.trunc() != 0.0 => seconds.trunc() as i64,
        _ => DEFAULT_TIMER_SECONDS,
    }
}
