//! Swapped binary operators: `i < n` written as `i <= n`.

use bugseed_core::{BinOpRecord, Label, LearningConfig};
use bugseed_vector::EmbeddingOracles;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use std::collections::BTreeSet;

use crate::features::{concat, name_vector, node_type_vector, one_hot, type_vector};
use crate::{CodePiece, Example, ExamplePair, FeatureVector, Outcome, SkipReason, Vectorizer};

/// Layout: `left ++ right ++ operator one-hot ++ left type ++ right type ++
/// parent ++ grand parent`. The incorrect example swaps only the one-hot.
#[derive(Debug, Clone)]
pub struct BinOperatorVectorizer {
    type_embedding_size: usize,
    seen: BTreeSet<String>,
    operators: Vec<String>,
}

impl BinOperatorVectorizer {
    pub fn new(config: &LearningConfig) -> Self {
        Self {
            type_embedding_size: config.type_embedding_size,
            seen: BTreeSet::new(),
            operators: Vec::new(),
        }
    }

    /// Operator vocabulary, sorted.
    pub fn operators(&self) -> &[String] {
        &self.operators
    }

    fn operator_index(&self, op: &str) -> Option<usize> {
        self.operators.binary_search_by(|o| o.as_str().cmp(op)).ok()
    }

    fn vector_with_operator(
        &self,
        record: &BinOpRecord,
        oracles: &EmbeddingOracles,
        operator_index: usize,
    ) -> Result<FeatureVector, SkipReason> {
        let left = name_vector(oracles, &record.left)?;
        let right = name_vector(oracles, &record.right)?;
        let parent = node_type_vector(oracles, &record.parent)?;
        let grand_parent = node_type_vector(oracles, &record.grand_parent)?;
        let operator = one_hot(operator_index, self.operators.len());
        let left_type = type_vector(oracles, &record.left_type, self.type_embedding_size);
        let right_type = type_vector(oracles, &record.right_type, self.type_embedding_size);
        Ok(concat(&[
            left,
            right,
            &operator,
            &left_type,
            &right_type,
            parent,
            grand_parent,
        ]))
    }
}

impl Default for BinOperatorVectorizer {
    fn default() -> Self {
        Self::new(&LearningConfig::default())
    }
}

fn code_piece(record: &BinOpRecord, op: &str) -> CodePiece {
    CodePiece::BinOp {
        src: record.src.clone(),
        left: record.left.clone(),
        op: op.to_string(),
        right: record.right.clone(),
    }
}

impl Vectorizer for BinOperatorVectorizer {
    type Record = BinOpRecord;

    fn observe(&mut self, record: &BinOpRecord) {
        self.seen.insert(record.op.clone());
    }

    fn finish_prescan(&mut self) {
        self.operators = self.seen.iter().cloned().collect();
    }

    fn features(
        &self,
        record: &BinOpRecord,
        oracles: &EmbeddingOracles,
    ) -> Result<(FeatureVector, CodePiece), SkipReason> {
        let index = self
            .operator_index(&record.op)
            .ok_or(SkipReason::UnknownOperator)?;
        let x = self.vector_with_operator(record, oracles, index)?;
        Ok((x, code_piece(record, &record.op)))
    }

    fn record_to_examples(
        &self,
        record: &BinOpRecord,
        oracles: &EmbeddingOracles,
        rng: &mut StdRng,
    ) -> Outcome {
        let (x_correct, correct_piece) = self.features(record, oracles)?;

        let others: Vec<usize> = (0..self.operators.len())
            .filter(|&i| self.operators[i] != record.op)
            .collect();
        let &other = others.choose(rng).ok_or(SkipReason::NoCandidateSubstitute)?;
        let x_incorrect = self.vector_with_operator(record, oracles, other)?;

        Ok(ExamplePair {
            correct: Example::new(x_correct, Label::Correct, correct_piece),
            incorrect: Example::new(
                x_incorrect,
                Label::Incorrect,
                code_piece(record, &self.operators[other]),
            ),
        })
    }
}
