use bugseed_core::{AnalysedFile, BugMetadata, BugSeedingPattern, Result, TargetLocation};
use bugseed_vector::TokenEmbedder;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::{
    remove_subsumed, splice_variant, AvailableTokens, SeedingContext, SeedingError,
    SeedingRejection, SeedingStrategy, TopFrequent,
};

/// One seeded bug: the whole mutated file plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SeededBug {
    /// 1-based count of mutated locations in the file at the time of seeding.
    pub location_number: usize,
    /// Index of the variant among those produced at this location.
    pub variant: usize,
    /// File tokens after seeding.
    pub tokens: Vec<String>,
    pub metadata: BugMetadata,
}

impl SeededBug {
    /// The mutated file, tokens joined with single spaces.
    pub fn code(&self) -> String {
        self.tokens.join(" ")
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FileSeedingReport {
    pub file_path: String,
    pub locations_considered: usize,
    /// Locations where at least one pattern produced a bug.
    pub locations_mutated: usize,
    #[serde(skip)]
    pub bugs: Vec<SeededBug>,
    pub rejections: BTreeMap<SeedingRejection, usize>,
}

impl FileSeedingReport {
    fn reject(&mut self, rejection: SeedingRejection) {
        *self.rejections.entry(rejection).or_insert(0) += 1;
    }
}

/// Applies every pattern to every candidate location of a file.
pub struct FileSeeder<'a> {
    strategy: SeedingStrategy,
    patterns: &'a [BugSeedingPattern],
    embedder: &'a dyn TokenEmbedder,
    frequent: &'a TopFrequent,
    max_locations: Option<usize>,
    remove_subsumed: bool,
}

impl<'a> FileSeeder<'a> {
    pub fn new(
        strategy: SeedingStrategy,
        patterns: &'a [BugSeedingPattern],
        embedder: &'a dyn TokenEmbedder,
        frequent: &'a TopFrequent,
    ) -> Self {
        Self {
            strategy,
            patterns,
            embedder,
            frequent,
            max_locations: None,
            remove_subsumed: true,
        }
    }

    pub fn with_max_locations(mut self, max_locations: Option<usize>) -> Self {
        self.max_locations = max_locations;
        self
    }

    pub fn with_remove_subsumed(mut self, remove_subsumed: bool) -> Self {
        self.remove_subsumed = remove_subsumed;
        self
    }

    /// Seeds the analysis result stored at `path`. A file the extractor
    /// could not analyse yields an empty report.
    pub fn seed_path(&self, path: &Path, rng: &mut StdRng) -> Result<FileSeedingReport> {
        let content = std::fs::read_to_string(path)?;
        match AnalysedFile::from_json(&content)? {
            Some(file) => self.seed_file(&file, rng),
            None => {
                debug!("{} was not analysed, nothing to seed", path.display());
                Ok(FileSeedingReport {
                    file_path: path.display().to_string(),
                    ..FileSeedingReport::default()
                })
            }
        }
    }

    pub fn seed_file(&self, file: &AnalysedFile, rng: &mut StdRng) -> Result<FileSeedingReport> {
        let mut report = FileSeedingReport {
            file_path: file.file_path.clone(),
            ..FileSeedingReport::default()
        };

        let mut locations: Vec<TargetLocation> = file.nodes.clone();
        locations.shuffle(rng);
        if let Some(max) = self.max_locations {
            locations.truncate(max);
        }
        if self.remove_subsumed {
            locations = remove_subsumed(locations);
        }
        report.locations_considered = locations.len();
        if locations.is_empty() || self.patterns.is_empty() {
            return Ok(report);
        }

        let token_ranges = file.token_ranges()?;
        let available = AvailableTokens::new(file, self.frequent);
        let ctx = SeedingContext {
            embedder: self.embedder,
            available: &available,
        };

        for pattern in self.patterns {
            for target in &locations {
                let outcome = self
                    .strategy
                    .matches(pattern, target, &ctx)
                    .and_then(|matched| Ok((matched, self.strategy.apply(pattern, target, &ctx)?)));
                let (matched, mutation) = match outcome {
                    Ok(resolved) => resolved,
                    Err(SeedingError::Rejected(rejection)) => {
                        report.reject(rejection);
                        continue;
                    }
                    Err(SeedingError::Core(e)) => return Err(e),
                };
                if mutation.variants.is_empty() {
                    report.reject(SeedingRejection::EmptyCandidateScope);
                    continue;
                }

                report.locations_mutated += 1;
                for (variant, buggy_tokens) in mutation.variants.into_iter().enumerate() {
                    let tokens = splice_variant(&file.token_list, &token_ranges, target, &buggy_tokens)?;
                    let mut metadata = BugMetadata::for_target(&file.file_path, target);
                    metadata.buggy_tokens = buggy_tokens;
                    metadata.buggy_abstraction = pattern.buggy.clone();
                    metadata.num_of_available_identifiers_to_choose_from = mutation.identifiers_available;
                    metadata.num_of_available_literals_to_choose_from = mutation.literals_available;
                    metadata.mean_similarity = matched.mean_similarity;
                    metadata.seeding_pattern_url = pattern.url.clone();

                    report.bugs.push(SeededBug {
                        location_number: report.locations_mutated,
                        variant,
                        tokens,
                        metadata,
                    });
                }
            }
        }

        info!(
            "Seeded {} bugs at {} of {} locations in {}",
            report.bugs.len(),
            report.locations_mutated,
            report.locations_considered,
            file.file_path
        );
        Ok(report)
    }
}
