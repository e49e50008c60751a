use bugseed_core::{BugSeedError, CodeLocation, Label, RecordEntry};
use bugseed_vector::EmbeddingOracles;
use rand::rngs::StdRng;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use crate::{CodePiece, DataReader, Example, ExamplePair, FeatureVector, Outcome, SkipReason, TrainingSet, VectorizeStats};

/// Bug classes with a dedicated vectorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BugClass {
    SwappedBinOperator,
    WrongBinOperand,
    WrongAssignment,
}

impl FromStr for BugClass {
    type Err = BugSeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "swapped_bin_operator" | "bin_operator" | "operator" => Ok(BugClass::SwappedBinOperator),
            "wrong_bin_operand" | "bin_operand" | "operand" => Ok(BugClass::WrongBinOperand),
            "wrong_assignment" | "assignment" => Ok(BugClass::WrongAssignment),
            other => Err(BugSeedError::Config(format!("unknown bug class '{}'", other))),
        }
    }
}

impl fmt::Display for BugClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BugClass::SwappedBinOperator => "swapped_bin_operator",
            BugClass::WrongBinOperand => "wrong_bin_operand",
            BugClass::WrongAssignment => "wrong_assignment",
        };
        f.write_str(name)
    }
}

/// Builds (correct, incorrect) feature-vector pairs for one bug class.
///
/// A vectorizer first sees every record of the training and validation
/// splits (`prescan`) to fix its vocabulary, then converts records one at a
/// time. Conversions never fail; a record that cannot be used yields a
/// [`SkipReason`].
pub trait Vectorizer {
    type Record: CodeLocation + DeserializeOwned;

    /// Adds one record to the vocabulary.
    fn observe(&mut self, record: &Self::Record);

    /// Called once all records have been observed.
    fn finish_prescan(&mut self) {}

    /// Feature vector of the record as written, with its provenance.
    fn features(
        &self,
        record: &Self::Record,
        oracles: &EmbeddingOracles,
    ) -> Result<(FeatureVector, CodePiece), SkipReason>;

    /// The record as a correct example plus a synthesized incorrect one.
    fn record_to_examples(
        &self,
        record: &Self::Record,
        oracles: &EmbeddingOracles,
        rng: &mut StdRng,
    ) -> Outcome;

    fn prescan(&mut self, training: &[PathBuf], validation: &[PathBuf]) -> usize {
        let mut seen = 0;
        for paths in [training, validation] {
            for record in DataReader::new(paths.iter().cloned()).records::<Self::Record>() {
                self.observe(&record);
                seen += 1;
            }
        }
        self.finish_prescan();
        info!("Prescan observed {} records", seen);
        seen
    }

    /// Vectorizes records that already carry both labels. The pair is
    /// emitted only when a correct and an incorrect vector were produced.
    fn pair_to_examples(&self, records: &[Self::Record], oracles: &EmbeddingOracles) -> Outcome {
        let mut correct: Option<Example> = None;
        let mut incorrect: Option<Example> = None;
        for record in records {
            let (x, code_piece) = self.features(record, oracles)?;
            let example = Example::new(x, record.label(), code_piece);
            match record.label() {
                Label::Correct => correct = Some(example),
                Label::Incorrect => incorrect = Some(example),
            }
        }
        match (correct, incorrect) {
            (Some(correct), Some(incorrect)) => Ok(ExamplePair { correct, incorrect }),
            _ => Err(SkipReason::IncompletePair),
        }
    }

    fn entry_to_examples(
        &self,
        entry: &RecordEntry<Self::Record>,
        oracles: &EmbeddingOracles,
        rng: &mut StdRng,
    ) -> Outcome {
        match entry {
            RecordEntry::Single(record) => self.record_to_examples(record, oracles, rng),
            RecordEntry::Group(records) => self.pair_to_examples(records, oracles),
        }
    }

    /// Converts every entry of `reader` into a training set.
    fn vectorize(
        &self,
        reader: &DataReader,
        oracles: &EmbeddingOracles,
        rng: &mut StdRng,
    ) -> (TrainingSet, VectorizeStats) {
        let mut set = TrainingSet::new();
        let mut stats = VectorizeStats::default();
        for entry in reader.entries::<Self::Record>() {
            let outcome = self.entry_to_examples(&entry, oracles, rng);
            stats.record(&outcome);
            if let Ok(pair) = outcome {
                set.push_pair(pair);
            }
        }
        (set, stats)
    }

    /// Score that the original code is buggy.
    fn anomaly_score(&self, prediction_orig: f32, _prediction_changed: f32) -> f32 {
        prediction_orig
    }

    /// Score that the original code is fine.
    fn normal_score(&self, _prediction_orig: f32, prediction_changed: f32) -> f32 {
        prediction_changed
    }
}
