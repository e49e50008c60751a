//! Seeds realistic bugs into analysed source files by replaying
//! bug-introducing token edits mined from commits.

pub mod error;
pub mod expand;
pub mod overlap;
pub mod scope;
pub mod seeder;
pub mod splice;
pub mod strategy;
pub mod writer;

pub use error::*;
pub use expand::{expand_variants, Slot};
pub use overlap::remove_subsumed;
pub use scope::{AvailableTokens, TopFrequent};
pub use seeder::{FileSeeder, FileSeedingReport, SeededBug};
pub use splice::splice_variant;
pub use strategy::{MatchOutcome, Mutation, SeedingContext, SeedingStrategy};
pub use writer::SeededFileWriter;
