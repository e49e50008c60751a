use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorError {
    #[error("Dimension mismatch: expected {0}, got {1}")]
    DimensionMismatch(usize, usize),

    #[error("Vector is empty")]
    EmptyVector,

    #[error("Invalid vector operation: {0}")]
    InvalidOperation(String),

    #[error("Embedding table '{table}' is invalid: {reason}")]
    InvalidTable { table: String, reason: String },
}

impl From<VectorError> for bugseed_core::BugSeedError {
    fn from(err: VectorError) -> Self {
        bugseed_core::BugSeedError::Embedding(err.to_string())
    }
}
