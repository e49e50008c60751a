//! Wrong binary operands: `i < n` written as `i < m` with `m` from the same file.

use bugseed_core::{source_file, BinOpRecord, CodeLocation, Label, LearningConfig};
use bugseed_vector::{EmbeddingLookup, EmbeddingOracles};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::{BTreeSet, HashMap};

use crate::features::{concat, name_vector, node_type_vector, one_hot, type_vector};
use crate::{CodePiece, Example, ExamplePair, FeatureVector, Outcome, SkipReason, Vectorizer};

/// An operand observed in some file, with its inferred type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Operand {
    pub name: String,
    pub type_name: String,
}

impl Operand {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Same layout as [`crate::BinOperatorVectorizer`]. The incorrect example
/// replaces the left or the right operand, name and type, in place.
#[derive(Debug, Clone)]
pub struct BinaryOperandVectorizer {
    type_embedding_size: usize,
    seen_operators: BTreeSet<String>,
    operators: Vec<String>,
    file_to_operands: HashMap<String, BTreeSet<Operand>>,
}

impl BinaryOperandVectorizer {
    pub fn new(config: &LearningConfig) -> Self {
        Self {
            type_embedding_size: config.type_embedding_size,
            seen_operators: BTreeSet::new(),
            operators: Vec::new(),
            file_to_operands: HashMap::new(),
        }
    }

    pub fn operators(&self) -> &[String] {
        &self.operators
    }

    /// Operands seen in `file`, sorted.
    pub fn operands_in(&self, file: &str) -> Option<&BTreeSet<Operand>> {
        self.file_to_operands.get(file)
    }

    fn assemble(
        &self,
        oracles: &EmbeddingOracles,
        left: &Operand,
        right: &Operand,
        operator_index: usize,
        record: &BinOpRecord,
    ) -> Result<FeatureVector, SkipReason> {
        let left_vector = name_vector(oracles, &left.name)?;
        let right_vector = name_vector(oracles, &right.name)?;
        let parent = node_type_vector(oracles, &record.parent)?;
        let grand_parent = node_type_vector(oracles, &record.grand_parent)?;
        let operator = one_hot(operator_index, self.operators.len());
        let left_type = type_vector(oracles, &left.type_name, self.type_embedding_size);
        let right_type = type_vector(oracles, &right.type_name, self.type_embedding_size);
        Ok(concat(&[
            left_vector,
            right_vector,
            &operator,
            &left_type,
            &right_type,
            parent,
            grand_parent,
        ]))
    }

    fn operator_index(&self, op: &str) -> Result<usize, SkipReason> {
        self.operators
            .binary_search_by(|o| o.as_str().cmp(op))
            .map_err(|_| SkipReason::UnknownOperator)
    }
}

impl Default for BinaryOperandVectorizer {
    fn default() -> Self {
        Self::new(&LearningConfig::default())
    }
}

fn operands(record: &BinOpRecord) -> (Operand, Operand) {
    (
        Operand::new(&record.left, &record.left_type),
        Operand::new(&record.right, &record.right_type),
    )
}

fn code_piece(record: &BinOpRecord, left: &Operand, right: &Operand) -> CodePiece {
    CodePiece::BinOp {
        src: record.src.clone(),
        left: left.name.clone(),
        op: record.op.clone(),
        right: right.name.clone(),
    }
}

impl Vectorizer for BinaryOperandVectorizer {
    type Record = BinOpRecord;

    fn observe(&mut self, record: &BinOpRecord) {
        let (left, right) = operands(record);
        let operands = self
            .file_to_operands
            .entry(source_file(&record.src).to_string())
            .or_default();
        operands.insert(left);
        operands.insert(right);
        self.seen_operators.insert(record.op.clone());
    }

    fn finish_prescan(&mut self) {
        self.operators = self.seen_operators.iter().cloned().collect();
    }

    fn features(
        &self,
        record: &BinOpRecord,
        oracles: &EmbeddingOracles,
    ) -> Result<(FeatureVector, CodePiece), SkipReason> {
        let (left, right) = operands(record);
        let index = self.operator_index(&record.op)?;
        let x = self.assemble(oracles, &left, &right, index, record)?;
        Ok((x, code_piece(record, &left, &right)))
    }

    fn record_to_examples(
        &self,
        record: &BinOpRecord,
        oracles: &EmbeddingOracles,
        rng: &mut StdRng,
    ) -> Outcome {
        let (x_correct, correct_piece) = self.features(record, oracles)?;
        let (left, right) = operands(record);

        let replace_left = rng.random_bool(0.5);
        let replaced = if replace_left { &left } else { &right };
        let candidates: Vec<&Operand> = self
            .file_to_operands
            .get(record.file())
            .into_iter()
            .flatten()
            .filter(|o| o.name != replaced.name && oracles.names.contains(&o.name))
            .collect();
        let &other = candidates.choose(rng).ok_or(SkipReason::NoCandidateSubstitute)?;

        let (new_left, new_right) = if replace_left {
            (other, &right)
        } else {
            (&left, other)
        };
        let index = self.operator_index(&record.op)?;
        let x_incorrect = self.assemble(oracles, new_left, new_right, index, record)?;

        Ok(ExamplePair {
            correct: Example::new(x_correct, Label::Correct, correct_piece),
            incorrect: Example::new(
                x_incorrect,
                Label::Incorrect,
                code_piece(record, new_left, new_right),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn oracles() -> EmbeddingOracles {
        let mut oracles = EmbeddingOracles::default();
        oracles.names.insert("ID:i", vec![1.0, 0.0, 0.0]).unwrap();
        oracles.names.insert("ID:n", vec![0.0, 1.0, 0.0]).unwrap();
        oracles.names.insert("ID:m", vec![0.0, 0.0, 1.0]).unwrap();
        oracles.types.insert("number", vec![1.0, 0.0]).unwrap();
        oracles.types.insert("string", vec![0.0, 1.0]).unwrap();
        oracles.node_types.insert("IfStatement", vec![0.5; 4]).unwrap();
        oracles.node_types.insert("Program", vec![0.25; 4]).unwrap();
        oracles
    }

    fn config() -> LearningConfig {
        LearningConfig {
            type_embedding_size: 2,
            ..LearningConfig::default()
        }
    }

    fn record(left: &str, right: &str, right_type: &str, src: &str) -> BinOpRecord {
        BinOpRecord {
            left: left.into(),
            right: right.into(),
            op: "<".into(),
            left_type: "number".into(),
            right_type: right_type.into(),
            parent: "IfStatement".into(),
            grand_parent: "Program".into(),
            src: src.into(),
            label: Label::Correct,
        }
    }

    fn prescanned(records: &[BinOpRecord]) -> BinaryOperandVectorizer {
        let mut v = BinaryOperandVectorizer::new(&config());
        records.iter().for_each(|r| v.observe(r));
        v.finish_prescan();
        v
    }

    #[test]
    fn test_operands_grouped_by_file() {
        let v = prescanned(&[
            record("ID:i", "ID:n", "number", "a.js : 1 - 1"),
            record("ID:i", "ID:m", "string", "a.js : 2 - 2"),
            record("ID:i", "ID:n", "number", "b.js : 1 - 1"),
        ]);
        assert_eq!(v.operands_in("a.js").unwrap().len(), 3);
        assert_eq!(v.operands_in("b.js").unwrap().len(), 2);
        assert!(v.operands_in("c.js").is_none());
    }

    #[test]
    fn test_replacement_takes_the_replaced_side() {
        let target = record("ID:i", "ID:n", "number", "a.js : 1 - 1");
        let v = prescanned(&[target.clone(), record("ID:i", "ID:m", "string", "a.js : 2 - 2")]);

        // layout: left 0..3, right 3..6, op 6..7, left type 7..9, right type 9..11, parents 11..19
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pair = v.record_to_examples(&target, &oracles(), &mut rng).unwrap();
            let (c, i) = (&pair.correct.x, &pair.incorrect.x);
            assert_eq!(c.len(), 19);
            assert_eq!(c[6..7], i[6..7]);
            assert_eq!(c[11..], i[11..]);

            let CodePiece::BinOp { left, right, .. } = &pair.incorrect.code_piece else {
                panic!("expected a binary operation");
            };
            if left != "ID:i" {
                assert_eq!(right, "ID:n");
                assert_eq!(c[3..6], i[3..6]);
                assert_eq!(c[9..11], i[9..11]);
                assert_ne!(c[0..3], i[0..3]);
            } else {
                assert_ne!(right, "ID:n");
                assert_eq!(c[0..3], i[0..3]);
                assert_eq!(c[7..9], i[7..9]);
                assert_ne!(c[3..6], i[3..6]);
                if right == "ID:m" {
                    assert_eq!(i[9..11], [0.0, 1.0]);
                }
            }
        }
    }

    #[test]
    fn test_no_substitute_in_single_operand_file() {
        let target = record("ID:i", "ID:i", "number", "solo.js : 1 - 1");
        let v = prescanned(&[target.clone()]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            v.record_to_examples(&target, &oracles(), &mut rng),
            Err(SkipReason::NoCandidateSubstitute)
        );
    }

    #[test]
    fn test_candidates_need_a_name_embedding() {
        let target = record("ID:i", "ID:n", "number", "a.js : 1 - 1");
        let v = prescanned(&[target.clone(), record("ID:unknown", "ID:i", "number", "a.js : 2 - 2")]);
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            if let Ok(pair) = v.record_to_examples(&target, &oracles(), &mut rng) {
                let CodePiece::BinOp { left, right, .. } = pair.incorrect.code_piece else {
                    panic!("expected a binary operation");
                };
                assert_ne!(left, "ID:unknown");
                assert_ne!(right, "ID:unknown");
            }
        }
    }
}
