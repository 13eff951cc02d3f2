//! Raw and normalized question records
//!
//! A raw record is one spreadsheet row as a flat column → cell mapping. Cells
//! may be text, numbers, booleans or blank. The normalized record has every
//! column resolved to a trimmed string, except `level` and `timer` which are
//! coerced to integers.
//!
//! Both shapes share the spreadsheet column names, so a normalized record can
//! be serialized and fed back in as a raw record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default question timer when the cell is blank, zero or not a number
pub const DEFAULT_TIMER_SECONDS: i64 = 30;

/// One uploaded row: column name → raw cell value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style cell assignment (used by tests and the CLI)
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.0.insert(column.to_string(), value.into());
        self
    }

    /// Cell lookup trying each column name in turn
    pub fn cell(&self, columns: &[&str]) -> Option<&Value> {
        columns
            .iter()
            .filter_map(|c| self.0.get(*c))
            .find(|v| !v.is_null())
    }

    /// Cell rendered as trimmed text; blank when absent
    pub fn text(&self, columns: &[&str]) -> String {
        self.cell(columns).map(cell_to_string).unwrap_or_default()
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Render one spreadsheet cell as trimmed text
///
/// Integral floats lose their fraction (`1968.0` → "1968"), booleans become
/// "true"/"false".
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        other => other.to_string().trim().to_string(),
    }
}

/// Numeric view of a cell: numbers as-is, text parsed after trimming
pub fn cell_to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

/// Canonical record produced by the normalizer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizedRecord {
    /// Lower-cased subject name
    pub subject: String,
    /// Level number; `None` when blank or not an integer
    pub level: Option<i64>,
    /// Lower-cased question type tag
    #[serde(rename = "type")]
    pub question_type: String,
    #[serde(rename = "question")]
    pub question_text: String,
    pub image_url: String,
    pub timer: i64,

    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: String,

    pub left_item1: String,
    pub right_item1: String,
    pub left_item2: String,
    pub right_item2: String,
    pub left_item3: String,
    pub right_item3: String,
    pub left_item4: String,
    pub right_item4: String,

    pub answer: String,

    pub step1: String,
    pub step2: String,
    pub step3: String,
    pub step4: String,

    pub is_true: String,
}

impl NormalizedRecord {
    /// Options A-D in declaration order
    pub fn options(&self) -> [&str; 4] {
        [
            self.option_a.as_str(),
            self.option_b.as_str(),
            self.option_c.as_str(),
            self.option_d.as_str(),
        ]
    }

    /// Matching slots 1-4 as (left, right)
    pub fn pair_slots(&self) -> [(&str, &str); 4] {
        [
            (self.left_item1.as_str(), self.right_item1.as_str()),
            (self.left_item2.as_str(), self.right_item2.as_str()),
            (self.left_item3.as_str(), self.right_item3.as_str()),
            (self.left_item4.as_str(), self.right_item4.as_str()),
        ]
    }

    /// Reorder step slots 1-4
    pub fn step_slots(&self) -> [&str; 4] {
        [
            self.step1.as_str(),
            self.step2.as_str(),
            self.step3.as_str(),
            self.step4.as_str(),
        ]
    }

    /// Short question preview for reports and logs
    pub fn preview(&self, max_chars: usize) -> String {
        if self.question_text.is_empty() {
            return "Empty".to_string();
        }
        self.question_text.chars().take(max_chars).collect()
    }

    /// Serialize back into a raw record using the spreadsheet column names
    pub fn to_raw(&self) -> RawRecord {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => RawRecord::from(map),
            _ => RawRecord::new(),
        }
    }
}
