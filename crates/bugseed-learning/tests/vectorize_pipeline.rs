use approx::assert_relative_eq;
use bugseed_core::LearningConfig;
use bugseed_learning::{
    AssignmentVectorizer, BinOperatorVectorizer, DataReader, SkipReason, TrainingSet, Vectorizer,
};
use bugseed_vector::{EmbeddingOracles, EmbeddingTable};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn oracles() -> EmbeddingOracles {
    let names = EmbeddingTable::from_json_str(
        "name",
        r#"{"ID:i": [1, 0, 0], "ID:n": [0, 1, 0], "LIT:0": [0, 0, 1], "ID:x": [1, 1, 0]}"#,
    )
    .unwrap();
    let types = EmbeddingTable::from_json_str("type", r#"{"number": [1, 0, 0, 0, 0]}"#).unwrap();
    let node_types = EmbeddingTable::from_json_str(
        "node type",
        r#"{"IfStatement": [1, 0, 0, 0, 0, 0, 0, 0], "BlockStatement": [0, 1, 0, 0, 0, 0, 0, 0],
            "ExpressionStatement": [0, 0, 1, 0, 0, 0, 0, 0]}"#,
    )
    .unwrap();
    EmbeddingOracles::new(names, types, node_types)
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const BIN_OPS: &str = r#"[
  {"left": "ID:i", "right": "ID:n", "op": "<", "leftType": "number", "rightType": "number",
   "parent": "IfStatement", "grandParent": "BlockStatement", "src": "a.js : 1 - 1"},
  {"left": "ID:i", "right": "LIT:0", "op": "===", "leftType": "number", "rightType": "number",
   "parent": "IfStatement", "grandParent": "BlockStatement", "src": "a.js : 2 - 2"},
  {"left": "ID:unknown", "right": "LIT:0", "op": ">", "leftType": "number", "rightType": "number",
   "parent": "IfStatement", "grandParent": "BlockStatement", "src": "a.js : 3 - 3"},
  [
    {"left": "ID:i", "right": "ID:n", "op": "<", "leftType": "number", "rightType": "number",
     "parent": "IfStatement", "grandParent": "BlockStatement", "src": "b.js : 1 - 1",
     "probability_that_incorrect": 0},
    {"left": "ID:i", "right": "ID:n", "op": ">", "leftType": "number", "rightType": "number",
     "parent": "IfStatement", "grandParent": "BlockStatement", "src": "b_SEMSEED_MUTATED_1.js : 1 - 1",
     "probability_that_incorrect": 1}
  ]
]"#;

#[test]
fn test_bin_operator_pipeline() {
    let dir = TempDir::new().unwrap();
    let training = write(&dir, "train.json", BIN_OPS);
    let validation = write(&dir, "valid.json", "[]");

    let mut vectorizer = BinOperatorVectorizer::new(&LearningConfig::default());
    let seen = vectorizer.prescan(&[training.clone()], &[validation]);
    assert_eq!(seen, 5);
    assert_eq!(vectorizer.operators(), &["<", "===", ">"]);

    let reader = DataReader::new([training]);
    let mut rng = StdRng::seed_from_u64(42);
    let (set, stats) = vectorizer.vectorize(&reader, &oracles(), &mut rng);

    assert_eq!(stats.records_seen, 4);
    assert_eq!(stats.pairs_emitted, 3);
    assert_eq!(stats.skipped[&SkipReason::MissingEmbedding], 1);
    assert_eq!(set.len(), 6);
    // 3 + 3 names, 3 operators, 5 + 5 types, 8 + 8 node types
    assert_eq!(set.dimension(), Some(35));
    assert_eq!(set.ys.iter().filter(|y| y[0] == 1.0).count(), 3);
    for x in &set.xs {
        let operator_mass: f32 = x[6..9].iter().sum();
        assert_relative_eq!(operator_mass, 1.0);
    }

    let out = dir.path().join("training.json");
    set.save(&out).unwrap();
    let loaded: TrainingSet = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(loaded, set);
}

#[test]
fn test_vectorize_is_reproducible() {
    let dir = TempDir::new().unwrap();
    let training = write(&dir, "train.json", BIN_OPS);
    let mut vectorizer = BinOperatorVectorizer::default();
    vectorizer.prescan(&[training.clone()], &[]);
    let reader = DataReader::new([training]);

    let (first, _) = vectorizer.vectorize(&reader, &oracles(), &mut StdRng::seed_from_u64(3));
    let (second, _) = vectorizer.vectorize(&reader, &oracles(), &mut StdRng::seed_from_u64(3));
    assert_eq!(first, second);
}

#[test]
fn test_assignment_pipeline() {
    let dir = TempDir::new().unwrap();
    let data = write(
        &dir,
        "assignments.json",
        r#"[
          {"lhs": "ID:x", "rhs": "ID:i", "rhsType": "number", "parent": "ExpressionStatement",
           "grandParent": "BlockStatement", "src": "c.js : 1 - 1"},
          {"lhs": "ID:x", "rhs": "ID:n", "rhsType": "number", "parent": "ExpressionStatement",
           "grandParent": "BlockStatement", "src": "c.js : 2 - 2"},
          {"lhs": "ID:x", "rhs": "ID:i", "rhsType": "number", "parent": "ExpressionStatement",
           "grandParent": "BlockStatement", "src": "lonely.js : 1 - 1"}
        ]"#,
    );

    let mut vectorizer = AssignmentVectorizer::default();
    vectorizer.prescan(&[data.clone()], &[]);
    let mut rng = StdRng::seed_from_u64(42);
    let (set, stats) = vectorizer.vectorize(&DataReader::new([data]), &oracles(), &mut rng);

    assert_eq!(stats.pairs_emitted, 2);
    assert_eq!(stats.skipped[&SkipReason::NoCandidateSubstitute], 1);
    let messages: Vec<String> = set.code_pieces.iter().map(|p| p.to_message()).collect();
    assert_eq!(messages[0], "c.js : 1 - 1 | ID:x | ID:i");
    assert_eq!(messages[1], "c.js : 1 - 1 | ID:x | ID:n");
    assert_eq!(messages[3], "c.js : 2 - 2 | ID:x | ID:i");
}

#[test]
fn test_unseen_types_keep_row_length() {
    let mut oracles = oracles();
    oracles.types = EmbeddingTable::from_json_str("type", r#"{"number": [1, 0, 0, 0, 0, 0, 0, 0]}"#).unwrap();

    let dir = TempDir::new().unwrap();
    let data = write(
        &dir,
        "mixed.json",
        r#"[
          {"left": "ID:i", "right": "ID:n", "op": "<", "leftType": "number", "rightType": "number",
           "parent": "IfStatement", "grandParent": "BlockStatement", "src": "a.js : 1 - 1"},
          {"left": "ID:i", "right": "ID:n", "op": ">", "leftType": "regex", "rightType": "unknown",
           "parent": "IfStatement", "grandParent": "BlockStatement", "src": "a.js : 2 - 2"}
        ]"#,
    );

    // default config expects 5-dimensional types, the table has 8
    let mut vectorizer = BinOperatorVectorizer::new(&LearningConfig::default());
    vectorizer.prescan(&[data.clone()], &[]);
    let mut rng = StdRng::seed_from_u64(42);
    let (set, stats) = vectorizer.vectorize(&DataReader::new([data]), &oracles, &mut rng);

    assert_eq!(stats.pairs_emitted, 2);
    // 3 + 3 names, 2 operators, 8 + 8 types, 8 + 8 node types
    assert_eq!(set.dimension(), Some(40));
    assert!(set.xs.iter().all(|x| x.len() == 40));
    assert!(set.save(&dir.path().join("out.json")).is_ok());
}
