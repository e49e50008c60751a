use thiserror::Error;

#[derive(Error, Debug)]
pub enum BugSeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BugSeedError>;
