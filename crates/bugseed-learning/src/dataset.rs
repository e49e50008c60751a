//! Pairs records extracted from seeded files with the records of the
//! original code they were derived from.
//!
//! A seeded file `x_SEMSEED_MUTATED_1.js` has a sidecar `x_SEMSEED_MUTATED_1.json`
//! naming the original file and line span. Records from the original file
//! at that span are the correct examples; records from the seeded file are
//! the incorrect ones.

use bugseed_core::{sidecar_path, source_file, BugMetadata, CodeLocation, Label, SEEDED_FILE_MARKER};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::DataReader;

#[derive(Debug, Clone)]
struct LocationExamples<T> {
    correct: Vec<T>,
    incorrect: Vec<T>,
}

impl<T> Default for LocationExamples<T> {
    fn default() -> Self {
        Self {
            correct: Vec::new(),
            incorrect: Vec::new(),
        }
    }
}

/// Correct and incorrect records grouped by original location.
#[derive(Debug, Clone)]
pub struct SeededDataset<T> {
    locations: BTreeMap<String, LocationExamples<T>>,
    sidecars: HashMap<PathBuf, Option<String>>,
    orphaned: usize,
}

impl<T> Default for SeededDataset<T> {
    fn default() -> Self {
        Self {
            locations: BTreeMap::new(),
            sidecars: HashMap::new(),
            orphaned: 0,
        }
    }
}

impl<T> SeededDataset<T>
where
    T: CodeLocation + DeserializeOwned + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every record read from `reader`.
    pub fn add_from(&mut self, reader: &DataReader) {
        for record in reader.records::<T>() {
            self.add(record);
        }
    }

    /// Files the record under its original location. Records from seeded
    /// files whose sidecar cannot be read are counted as orphaned.
    pub fn add(&mut self, mut record: T) {
        let src = record.src().to_string();
        if src.contains(SEEDED_FILE_MARKER) {
            let Some(location) = self.original_location(source_file(&src)) else {
                self.orphaned += 1;
                return;
            };
            record.set_label(Label::Incorrect);
            self.locations.entry(location).or_default().incorrect.push(record);
        } else {
            record.set_label(Label::Correct);
            self.locations.entry(src).or_default().correct.push(record);
        }
    }

    fn original_location(&mut self, seeded_file: &str) -> Option<String> {
        let sidecar = sidecar_path(Path::new(seeded_file));
        self.sidecars
            .entry(sidecar)
            .or_insert_with_key(|path| match BugMetadata::load(path) {
                Ok(metadata) => Some(metadata.original_location()),
                Err(e) => {
                    warn!("No usable metadata at {}: {}", path.display(), e);
                    None
                }
            })
            .clone()
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    /// Records from seeded files that could not be traced back.
    pub fn orphaned(&self) -> usize {
        self.orphaned
    }

    /// `[correct, incorrect]` pairs. Every incorrect record is paired with the
    /// first correct record of its location; locations lacking either side
    /// are dropped.
    pub fn pairs(&self) -> Vec<Vec<T>> {
        let mut pairs = Vec::new();
        for (location, examples) in &self.locations {
            let Some(correct) = examples.correct.first() else {
                debug!("{}: no correct example", location);
                continue;
            };
            for incorrect in &examples.incorrect {
                pairs.push(vec![correct.clone(), incorrect.clone()]);
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bugseed_core::{BinOpRecord, LineRange};
    use std::fs;
    use tempfile::TempDir;

    fn record(src: &str, op: &str) -> BinOpRecord {
        BinOpRecord {
            left: "ID:g".into(),
            right: "LIT:67".into(),
            op: op.into(),
            left_type: "unknown".into(),
            right_type: "number".into(),
            parent: "IfStatement".into(),
            grand_parent: "BlockStatement".into(),
            src: src.into(),
            label: Label::Correct,
        }
    }

    fn write_sidecar(seeded: &Path, original: &str, line: &str) {
        let metadata = BugMetadata {
            file_name_where_intended: original.into(),
            correct_tokens: vec![],
            buggy_tokens: vec![],
            correct_abstraction: vec![],
            buggy_abstraction: vec![],
            target_line_range: LineRange {
                line: line.into(),
                range: [0, 1],
            },
            num_of_available_identifiers_to_choose_from: 0,
            num_of_available_literals_to_choose_from: 0,
            error: None,
            mean_similarity: None,
            seeding_pattern_url: String::new(),
        };
        fs::write(sidecar_path(seeded), serde_json::to_string(&metadata).unwrap()).unwrap();
    }

    #[test]
    fn test_seeded_records_pair_with_original_location() {
        let dir = TempDir::new().unwrap();
        let seeded_one = dir.path().join("1_SEMSEED_MUTATED_1.js");
        let seeded_two = dir.path().join("1_SEMSEED_MUTATED_2.js");
        write_sidecar(&seeded_one, "data/1.js", "6-6");
        write_sidecar(&seeded_two, "data/1.js", "6-6");

        let mut dataset = SeededDataset::new();
        dataset.add(record("data/1.js : 6 - 6", ">"));
        dataset.add(record("data/1.js : 6 - 6", ">"));
        dataset.add(record("data/1.js : 9 - 9", "<"));
        dataset.add(record(&format!("{} : 6 - 6", seeded_one.display()), ">="));
        dataset.add(record(&format!("{} : 6 - 6", seeded_two.display()), "<"));

        let pairs = dataset.pairs();
        assert_eq!(pairs.len(), 2);
        for pair in &pairs {
            assert_eq!(pair[0].label, Label::Correct);
            assert_eq!(pair[0].src, "data/1.js : 6 - 6");
            assert_eq!(pair[1].label, Label::Incorrect);
        }
        assert_eq!(pairs[0][1].op, ">=");
        assert_eq!(dataset.location_count(), 2);
        assert_eq!(dataset.orphaned(), 0);
    }

    #[test]
    fn test_missing_sidecar_orphans_record() {
        let dir = TempDir::new().unwrap();
        let seeded = dir.path().join("2_SEMSEED_MUTATED_1.js");
        let mut dataset = SeededDataset::new();
        dataset.add(record(&format!("{} : 1 - 1", seeded.display()), "+"));
        dataset.add(record(&format!("{} : 2 - 2", seeded.display()), "-"));
        assert_eq!(dataset.orphaned(), 2);
        assert!(dataset.pairs().is_empty());
    }
}
