//! Code-location records produced by the external extractor.
//!
//! Each record describes one binary operation or assignment, together with the
//! inferred types of its operands and the AST context it sits in. Records are
//! read once and never mutated.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{BugSeedError, Result};

/// Separator between the file path and the line range inside `src`.
pub const SRC_SEPARATOR: &str = " : ";

/// Whether a record describes original code or a corrupted variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "RawLabel", into = "u8")]
pub enum Label {
    #[default]
    Correct,
    Incorrect,
}

impl Label {
    /// Target value used when assembling training data.
    pub fn as_target(self) -> f32 {
        match self {
            Label::Correct => 0.0,
            Label::Incorrect => 1.0,
        }
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        match label {
            Label::Correct => 0,
            Label::Incorrect => 1,
        }
    }
}

/// The extractor writes the flag as an integer, a float or a string
/// depending on which tool produced the file.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLabel {
    Int(i64),
    Float(f64),
    Text(String),
}

impl TryFrom<RawLabel> for Label {
    type Error = String;

    fn try_from(raw: RawLabel) -> std::result::Result<Self, Self::Error> {
        let value = match raw {
            RawLabel::Int(v) => v,
            RawLabel::Float(v) => v.trunc() as i64,
            RawLabel::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid probability_that_incorrect '{}': {}", s, e))?
                .trunc() as i64,
        };
        match value {
            0 => Ok(Label::Correct),
            1 => Ok(Label::Incorrect),
            other => Err(format!("probability_that_incorrect must be 0 or 1, got {}", other)),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Returns the file part of a `"<file> : <lines>"` location string.
pub fn source_file(src: &str) -> &str {
    src.split(SRC_SEPARATOR).next().unwrap_or(src)
}

/// Common accessors shared by every record shape.
pub trait CodeLocation {
    fn src(&self) -> &str;
    fn label(&self) -> Label;
    fn set_label(&mut self, label: Label);

    fn file(&self) -> &str {
        source_file(self.src())
    }
}

/// A binary operation `left op right`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinOpRecord {
    pub left: String,
    pub right: String,
    pub op: String,
    #[serde(default)]
    pub left_type: String,
    #[serde(default)]
    pub right_type: String,
    pub parent: String,
    pub grand_parent: String,
    pub src: String,
    #[serde(rename = "probability_that_incorrect", default)]
    pub label: Label,
}

impl CodeLocation for BinOpRecord {
    fn src(&self) -> &str {
        &self.src
    }

    fn label(&self) -> Label {
        self.label
    }

    fn set_label(&mut self, label: Label) {
        self.label = label;
    }
}

/// An assignment `lhs = rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    pub lhs: String,
    pub rhs: String,
    #[serde(default)]
    pub rhs_type: String,
    pub parent: String,
    pub grand_parent: String,
    pub src: String,
    #[serde(rename = "probability_that_incorrect", default)]
    pub label: Label,
}

impl CodeLocation for AssignmentRecord {
    fn src(&self) -> &str {
        &self.src
    }

    fn label(&self) -> Label {
        self.label
    }

    fn set_label(&mut self, label: Label) {
        self.label = label;
    }
}

/// One entry of a record file: either a lone record, or a group of records
/// that already contains the correct and the incorrect variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordEntry<T> {
    Single(T),
    Group(Vec<T>),
}

impl<T> RecordEntry<T> {
    /// All records carried by this entry, in file order.
    pub fn records(&self) -> &[T] {
        match self {
            RecordEntry::Single(record) => std::slice::from_ref(record),
            RecordEntry::Group(records) => records,
        }
    }
}

/// Parses a JSON array of record entries.
pub fn parse_entries<T>(json: &str) -> Result<Vec<RecordEntry<T>>>
where
    T: for<'de> Deserialize<'de>,
{
    let value: serde_json::Value = serde_json::from_str(json)?;
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(BugSeedError::from))
            .collect(),
        other => Err(BugSeedError::InvalidRecord(format!(
            "expected a JSON array of records, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_file_strips_line_range() {
        assert_eq!(source_file("benchmarks/data/1.js : 6 - 6"), "benchmarks/data/1.js");
        assert_eq!(source_file("no-separator.js"), "no-separator.js");
    }

    #[test]
    fn test_label_accepts_numeric_and_text_flags() {
        let int: Label = serde_json::from_str("1").unwrap();
        let float: Label = serde_json::from_str("0.0").unwrap();
        let text: Label = serde_json::from_str("\"1\"").unwrap();
        assert_eq!(int, Label::Incorrect);
        assert_eq!(float, Label::Correct);
        assert_eq!(text, Label::Incorrect);
        assert!(serde_json::from_str::<Label>("3").is_err());
    }

    #[test]
    fn test_bin_op_record_from_extractor_json() {
        let json = r#"{
            "left": "ID:g", "right": "LIT:67", "op": ">",
            "leftType": "unknown", "rightType": "number",
            "parent": "IfStatement", "grandParent": "BlockStatement",
            "src": "benchmarks/data/data/1.js : 6 - 6",
            "probability_that_incorrect": 0
        }"#;
        let record: BinOpRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.left, "ID:g");
        assert_eq!(record.right_type, "number");
        assert_eq!(record.grand_parent, "BlockStatement");
        assert_eq!(record.label(), Label::Correct);
        assert_eq!(record.file(), "benchmarks/data/data/1.js");
    }

    #[test]
    fn test_parse_entries_mixes_single_and_grouped() {
        let json = r#"[
            {"lhs": "ID:a", "rhs": "ID:b", "rhsType": "string", "parent": "ExpressionStatement",
             "grandParent": "BlockStatement", "src": "f.js : 1 - 1"},
            [
              {"lhs": "ID:a", "rhs": "ID:b", "parent": "P", "grandParent": "G",
               "src": "f.js : 2 - 2", "probability_that_incorrect": 0},
              {"lhs": "ID:a", "rhs": "ID:c", "parent": "P", "grandParent": "G",
               "src": "g.js : 2 - 2", "probability_that_incorrect": 1}
            ]
        ]"#;
        let entries: Vec<RecordEntry<AssignmentRecord>> = parse_entries(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0], RecordEntry::Single(_)));
        assert_eq!(entries[1].records().len(), 2);
        assert_eq!(entries[1].records()[1].label, Label::Incorrect);
    }

    #[test]
    fn test_parse_entries_rejects_non_array() {
        let err = parse_entries::<BinOpRecord>("{}").unwrap_err();
        assert!(matches!(err, BugSeedError::InvalidRecord(_)));
    }
}
