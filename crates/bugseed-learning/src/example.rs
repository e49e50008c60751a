use bugseed_core::{BugSeedError, Label, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Concatenation of fixed-size sub-vectors describing one code location.
pub type FeatureVector = Vec<f32>;

/// Provenance of one example, kept next to the vector so predictions can be
/// traced back to source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodePiece {
    BinOp {
        src: String,
        left: String,
        op: String,
        right: String,
    },
    Assignment {
        src: String,
        lhs: String,
        rhs: String,
    },
}

impl CodePiece {
    pub fn to_message(&self) -> String {
        match self {
            CodePiece::BinOp {
                src,
                left,
                op,
                right,
            } => format!("{} | {} | {} | {}", src, left, op, right),
            CodePiece::Assignment { src, lhs, rhs } => format!("{} | {} | {}", src, lhs, rhs),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub x: FeatureVector,
    pub label: Label,
    pub code_piece: CodePiece,
}

impl Example {
    pub fn new(x: FeatureVector, label: Label, code_piece: CodePiece) -> Self {
        Self {
            x,
            label,
            code_piece,
        }
    }
}

/// A correct example and its incorrect counterpart.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamplePair {
    pub correct: Example,
    pub incorrect: Example,
}

/// Why a record produced no examples. These are expected outcomes, counted
/// rather than reported as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A referenced name or node type has no vector.
    MissingEmbedding,
    /// Nothing eligible to substitute for the corrupted field.
    NoCandidateSubstitute,
    /// The operator is not part of the prescanned vocabulary.
    UnknownOperator,
    /// A provided pair lacks its correct or its incorrect record.
    IncompletePair,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingEmbedding => "missing_embedding",
            SkipReason::NoCandidateSubstitute => "no_candidate_substitute",
            SkipReason::UnknownOperator => "unknown_operator",
            SkipReason::IncompletePair => "incomplete_pair",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Outcome = std::result::Result<ExamplePair, SkipReason>;

/// Counters for one vectorization run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorizeStats {
    pub records_seen: usize,
    pub pairs_emitted: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl VectorizeStats {
    pub fn record(&mut self, outcome: &Outcome) {
        self.records_seen += 1;
        match outcome {
            Ok(_) => self.pairs_emitted += 1,
            Err(reason) => *self.skipped.entry(*reason).or_insert(0) += 1,
        }
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn merge(&mut self, other: &VectorizeStats) {
        self.records_seen += other.records_seen;
        self.pairs_emitted += other.pairs_emitted;
        for (reason, count) in &other.skipped {
            *self.skipped.entry(*reason).or_insert(0) += count;
        }
    }
}

impl fmt::Display for VectorizeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records, {} pairs emitted, {} skipped",
            self.records_seen,
            self.pairs_emitted,
            self.skipped_total()
        )?;
        for (reason, count) in &self.skipped {
            write!(f, ", {}={}", reason, count)?;
        }
        Ok(())
    }
}

/// Training matrix in the layout the classifier consumes: one row per
/// example, targets `[0.0]` for correct and `[1.0]` for incorrect code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSet {
    pub xs: Vec<FeatureVector>,
    pub ys: Vec<[f32; 1]>,
    pub code_pieces: Vec<CodePiece>,
}

impl TrainingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the correct example followed by the incorrect one.
    pub fn push_pair(&mut self, pair: ExamplePair) {
        for example in [pair.correct, pair.incorrect] {
            self.xs.push(example.x);
            self.ys.push([example.label.as_target()]);
            self.code_pieces.push(example.code_piece);
        }
    }

    pub fn extend(&mut self, other: TrainingSet) {
        self.xs.extend(other.xs);
        self.ys.extend(other.ys);
        self.code_pieces.extend(other.code_pieces);
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Length of the feature vectors, if any example has been added.
    pub fn dimension(&self) -> Option<usize> {
        self.xs.first().map(Vec::len)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dim) = self.dimension() {
            if let Some(row) = self.xs.iter().position(|x| x.len() != dim) {
                return Err(BugSeedError::ContractViolation(format!(
                    "row {} has {} features, expected {}",
                    row,
                    self.xs[row].len(),
                    dim
                )));
            }
        }
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(op: &str) -> CodePiece {
        CodePiece::BinOp {
            src: "a.js : 1 - 1".into(),
            left: "ID:i".into(),
            op: op.into(),
            right: "LIT:0".into(),
        }
    }

    #[test]
    fn test_code_piece_messages() {
        assert_eq!(piece("<").to_message(), "a.js : 1 - 1 | ID:i | < | LIT:0");
        let assignment = CodePiece::Assignment {
            src: "b.js : 3 - 3".into(),
            lhs: "ID:x".into(),
            rhs: "ID:y".into(),
        };
        assert_eq!(assignment.to_message(), "b.js : 3 - 3 | ID:x | ID:y");
    }

    #[test]
    fn test_training_set_push_pair() {
        let mut set = TrainingSet::new();
        set.push_pair(ExamplePair {
            correct: Example::new(vec![1.0, 0.0], Label::Correct, piece("<")),
            incorrect: Example::new(vec![0.0, 1.0], Label::Incorrect, piece(">")),
        });
        assert_eq!(set.len(), 2);
        assert_eq!(set.ys, vec![[0.0], [1.0]]);
        assert_eq!(set.code_pieces[1], piece(">"));
        assert_eq!(set.dimension(), Some(2));
    }

    #[test]
    fn test_stats_count_outcomes() {
        let mut stats = VectorizeStats::default();
        stats.record(&Err(SkipReason::MissingEmbedding));
        stats.record(&Err(SkipReason::MissingEmbedding));
        stats.record(&Err(SkipReason::NoCandidateSubstitute));
        assert_eq!(stats.records_seen, 3);
        assert_eq!(stats.skipped_total(), 3);
        assert_eq!(stats.skipped[&SkipReason::MissingEmbedding], 2);

        let mut total = VectorizeStats::default();
        total.merge(&stats);
        total.merge(&stats);
        assert_eq!(total.records_seen, 6);
        assert_eq!(total.skipped[&SkipReason::NoCandidateSubstitute], 2);
        assert!(total.to_string().contains("missing_embedding=4"));
    }
}
