use bugseed_core::BugSeedError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a pattern produced nothing at a location. Expected, and counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedingRejection {
    /// Target abstraction differs from the pattern's fix side.
    PatternMismatch,
    /// The location has no identifier or literal to compare.
    NoPlaceholder,
    BelowSimilarityThreshold,
    /// No candidate token for an unbound placeholder.
    EmptyCandidateScope,
    /// The strategy cannot resolve unbound placeholders.
    UnboundWithoutEmbedding,
}

impl SeedingRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedingRejection::PatternMismatch => "pattern_mismatch",
            SeedingRejection::NoPlaceholder => "no_placeholder",
            SeedingRejection::BelowSimilarityThreshold => "below_similarity_threshold",
            SeedingRejection::EmptyCandidateScope => "empty_candidate_scope",
            SeedingRejection::UnboundWithoutEmbedding => "unbound_without_embedding",
        }
    }
}

impl fmt::Display for SeedingRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum SeedingError {
    #[error("Pattern rejected: {0}")]
    Rejected(SeedingRejection),

    #[error(transparent)]
    Core(#[from] BugSeedError),
}

impl From<SeedingRejection> for SeedingError {
    fn from(rejection: SeedingRejection) -> Self {
        SeedingError::Rejected(rejection)
    }
}

pub type SeedingResult<T> = std::result::Result<T, SeedingError>;
