//! Wrong assignments: `x = a` written as `x = b` with `b` from the same file.

use bugseed_core::{source_file, AssignmentRecord, CodeLocation, Label, LearningConfig};
use bugseed_vector::{EmbeddingLookup, EmbeddingOracles};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use std::collections::{BTreeSet, HashMap};
use tracing::trace;

use crate::features::{concat, name_vector, node_type_vector, type_vector};
use crate::{CodePiece, Example, ExamplePair, FeatureVector, Outcome, SkipReason, Vectorizer};

/// A right-hand side observed in some file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Rhs {
    value: String,
    type_name: String,
}

/// Layout: `lhs ++ rhs ++ rhs type ++ parent ++ grand parent`.
#[derive(Debug, Clone)]
pub struct AssignmentVectorizer {
    type_embedding_size: usize,
    file_to_rhs: HashMap<String, BTreeSet<Rhs>>,
}

impl AssignmentVectorizer {
    pub fn new(config: &LearningConfig) -> Self {
        Self {
            type_embedding_size: config.type_embedding_size,
            file_to_rhs: HashMap::new(),
        }
    }

    /// Number of distinct right-hand sides seen in `file`.
    pub fn rhs_count(&self, file: &str) -> usize {
        self.file_to_rhs.get(file).map_or(0, BTreeSet::len)
    }

    fn assemble(
        &self,
        oracles: &EmbeddingOracles,
        record: &AssignmentRecord,
        rhs: &str,
        rhs_type: &str,
    ) -> Result<FeatureVector, SkipReason> {
        let lhs_vector = name_vector(oracles, &record.lhs)?;
        let rhs_vector = name_vector(oracles, rhs)?;
        let parent = node_type_vector(oracles, &record.parent)?;
        let grand_parent = node_type_vector(oracles, &record.grand_parent)?;
        let rhs_type = type_vector(oracles, rhs_type, self.type_embedding_size);
        Ok(concat(&[lhs_vector, rhs_vector, &rhs_type, parent, grand_parent]))
    }
}

impl Default for AssignmentVectorizer {
    fn default() -> Self {
        Self::new(&LearningConfig::default())
    }
}

fn code_piece(record: &AssignmentRecord, rhs: &str) -> CodePiece {
    CodePiece::Assignment {
        src: record.src.clone(),
        lhs: record.lhs.clone(),
        rhs: rhs.to_string(),
    }
}

impl Vectorizer for AssignmentVectorizer {
    type Record = AssignmentRecord;

    fn observe(&mut self, record: &AssignmentRecord) {
        self.file_to_rhs
            .entry(source_file(&record.src).to_string())
            .or_default()
            .insert(Rhs {
                value: record.rhs.clone(),
                type_name: record.rhs_type.clone(),
            });
    }

    fn features(
        &self,
        record: &AssignmentRecord,
        oracles: &EmbeddingOracles,
    ) -> Result<(FeatureVector, CodePiece), SkipReason> {
        let x = self.assemble(oracles, record, &record.rhs, &record.rhs_type)?;
        Ok((x, code_piece(record, &record.rhs)))
    }

    fn record_to_examples(
        &self,
        record: &AssignmentRecord,
        oracles: &EmbeddingOracles,
        rng: &mut StdRng,
    ) -> Outcome {
        let (x_correct, correct_piece) = self.features(record, oracles)?;

        let candidates: Vec<&Rhs> = self
            .file_to_rhs
            .get(record.file())
            .into_iter()
            .flatten()
            .filter(|r| r.value != record.rhs && oracles.names.contains(&r.value))
            .collect();
        let &other = candidates.choose(rng).ok_or(SkipReason::NoCandidateSubstitute)?;
        trace!("{}: replacing {} with {}", record.src, record.rhs, other.value);

        let x_incorrect = self.assemble(oracles, record, &other.value, &other.type_name)?;
        Ok(ExamplePair {
            correct: Example::new(x_correct, Label::Correct, correct_piece),
            incorrect: Example::new(x_incorrect, Label::Incorrect, code_piece(record, &other.value)),
        })
    }
}
