//! Turns extracted code locations into training examples for the three
//! name-based bug detectors: swapped binary operators, wrong binary operands
//! and wrong assignment right-hand sides.

pub mod assignment;
pub mod binary_operand;
pub mod bin_operator;
pub mod dataset;
pub mod example;
pub mod features;
pub mod reader;
pub mod vectorizer;

pub use assignment::AssignmentVectorizer;
pub use binary_operand::{BinaryOperandVectorizer, Operand};
pub use bin_operator::BinOperatorVectorizer;
pub use dataset::SeededDataset;
pub use example::*;
pub use reader::DataReader;
pub use vectorizer::{BugClass, Vectorizer};
