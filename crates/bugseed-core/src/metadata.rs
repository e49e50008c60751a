//! Sidecar metadata written next to every seeded file.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};

use crate::{Result, TargetLocation, SRC_SEPARATOR};

/// Marker inserted into the names of seeded files.
pub const SEEDED_FILE_MARKER: &str = "_SEMSEED_MUTATED_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRange {
    /// Line span as `"start-end"`.
    pub line: String,
    /// Character offsets `[start, end]`.
    pub range: [usize; 2],
}

/// Where and how one bug was seeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugMetadata {
    pub file_name_where_intended: String,
    #[serde(rename = "target_token_sequence-Correct")]
    pub correct_tokens: Vec<String>,
    #[serde(rename = "target_token_sequence-Buggy", default)]
    pub buggy_tokens: Vec<String>,
    #[serde(rename = "token_sequence_abstraction-Correct")]
    pub correct_abstraction: Vec<String>,
    #[serde(rename = "token_sequence_abstraction-Buggy", default)]
    pub buggy_abstraction: Vec<String>,
    pub target_line_range: LineRange,
    #[serde(default)]
    pub num_of_available_identifiers_to_choose_from: usize,
    #[serde(default)]
    pub num_of_available_literals_to_choose_from: usize,
    /// `false` on disk when no error happened.
    #[serde(
        default,
        serialize_with = "serialize_error",
        deserialize_with = "deserialize_error"
    )]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_similarity: Option<f32>,
    #[serde(default)]
    pub seeding_pattern_url: String,
}

impl BugMetadata {
    /// Metadata for a location that has not been mutated yet.
    pub fn for_target(file_path: &str, target: &TargetLocation) -> Self {
        Self {
            file_name_where_intended: file_path.to_string(),
            correct_tokens: target.tokens.clone(),
            buggy_tokens: Vec::new(),
            correct_abstraction: target.abstracted_tokens.clone(),
            buggy_abstraction: Vec::new(),
            target_line_range: LineRange {
                line: target.line.clone(),
                range: target.range,
            },
            num_of_available_identifiers_to_choose_from: 0,
            num_of_available_literals_to_choose_from: 0,
            error: None,
            mean_similarity: None,
            seeding_pattern_url: String::new(),
        }
    }

    /// `"<file> : <start> - <end>"`, the `src` the extractor reports for the
    /// original location.
    pub fn original_location(&self) -> String {
        let line = self
            .target_line_range
            .line
            .split('-')
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(" - ");
        format!("{}{}{}", self.file_name_where_intended, SRC_SEPARATOR, line)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Sidecar path of a seeded file: `x.js` becomes `x.json`.
pub fn sidecar_path(seeded_file: &Path) -> PathBuf {
    let mut name = seeded_file.as_os_str().to_owned();
    name.push("on");
    PathBuf::from(name)
}

fn serialize_error<S: Serializer>(error: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(message) => serializer.serialize_str(message),
        None => serializer.serialize_bool(false),
    }
}

fn deserialize_error<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Message(String),
        Null(()),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(false) | Flag::Null(()) => None,
        Flag::Bool(true) => Some("error".to_string()),
        Flag::Message(message) => Some(message),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> BugMetadata {
        BugMetadata {
            file_name_where_intended: "data/1.js".into(),
            correct_tokens: vec!["a".into(), "==".into(), "b".into()],
            buggy_tokens: vec!["a".into(), "!=".into(), "b".into()],
            correct_abstraction: vec!["Idf_1".into(), "==".into(), "Idf_2".into()],
            buggy_abstraction: vec!["Idf_1".into(), "!=".into(), "Idf_2".into()],
            target_line_range: LineRange {
                line: "6-6".into(),
                range: [120, 126],
            },
            num_of_available_identifiers_to_choose_from: 4,
            num_of_available_literals_to_choose_from: 0,
            error: None,
            mean_similarity: Some(1.0),
            seeding_pattern_url: "https://example.org/commit/1".into(),
        }
    }

    #[test]
    fn test_metadata_keys_on_disk() {
        let json = serde_json::to_value(metadata()).unwrap();
        assert_eq!(json["target_token_sequence-Buggy"][1], "!=");
        assert_eq!(json["token_sequence_abstraction-Correct"][0], "Idf_1");
        assert_eq!(json["target_line_range"]["range"][1], 126);
        assert_eq!(json["error"], false);

        let back: BugMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, metadata());
    }

    #[test]
    fn test_error_flag_accepts_message() {
        let mut json = serde_json::to_value(metadata()).unwrap();
        json["error"] = serde_json::Value::String("write failed".into());
        let back: BugMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back.error.as_deref(), Some("write failed"));
    }

    #[test]
    fn test_original_location_and_sidecar() {
        assert_eq!(metadata().original_location(), "data/1.js : 6 - 6");
        assert_eq!(
            sidecar_path(Path::new("out/1_SEMSEED_MUTATED_2.js")),
            PathBuf::from("out/1_SEMSEED_MUTATED_2.json")
        );
    }
}
