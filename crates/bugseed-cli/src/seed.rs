use anyhow::{Context, Result};
use bugseed_core::{
    collect_files, parse_patterns, retain_placeholder_patterns, split_training_validation,
    BugSeedConfig, SeedingConfig,
};
use bugseed_seeding::{FileSeeder, SeededFileWriter, SeedingRejection, SeedingStrategy, TopFrequent};
use bugseed_vector::EmbeddingTable;
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::progress::create_progress_bar;
use crate::ScopeArg;

#[derive(Args)]
pub struct SeedArgs {
    /// Analysed files (JSON) or directories containing them
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Mined bug-seeding patterns (JSON array)
    #[arg(short, long)]
    patterns: PathBuf,

    /// Token embedding (JSON object of token -> vector)
    #[arg(short, long)]
    embedding: PathBuf,

    /// Most frequent identifiers of the corpus (JSON array)
    #[arg(long)]
    frequent_identifiers: Option<PathBuf>,

    /// Most frequent literals of the corpus (JSON array)
    #[arg(long)]
    frequent_literals: Option<PathBuf>,

    /// Directory receiving seeded files and their metadata
    #[arg(long)]
    out_dir: PathBuf,

    /// Matching strategy (semantic, syntactic), overrides seeding.strategy
    #[arg(long)]
    strategy: Option<String>,

    /// Similarity threshold, overrides seeding.similarity_threshold
    #[arg(long)]
    threshold: Option<f32>,

    /// Candidates per unbound token, overrides seeding.k
    #[arg(short)]
    k: Option<usize>,

    /// Where unbound tokens are drawn from, overrides seeding.scope
    #[arg(long, value_enum)]
    scope: Option<ScopeArg>,

    /// Locations tried per file, overrides seeding.max_locations
    #[arg(long)]
    max_locations: Option<usize>,

    /// Random seed, overrides seeding.seed
    #[arg(long)]
    seed: Option<u64>,
}

impl SeedArgs {
    fn seeding_config(&self, base: &SeedingConfig) -> SeedingConfig {
        let mut config = base.clone();
        if let Some(strategy) = &self.strategy {
            config.strategy = strategy.clone();
        }
        if let Some(threshold) = self.threshold {
            config.similarity_threshold = threshold;
        }
        if let Some(k) = self.k {
            config.k = k;
        }
        if let Some(scope) = self.scope {
            config.scope = scope.into();
        }
        if self.max_locations.is_some() {
            config.max_locations = self.max_locations;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }
}

#[derive(Default)]
struct RunTotals {
    files_seeded: usize,
    files_failed: usize,
    locations_considered: usize,
    locations_mutated: usize,
    bugs_written: usize,
    write_failures: usize,
    rejections: BTreeMap<SeedingRejection, usize>,
}

impl RunTotals {
    fn merge(mut self, other: RunTotals) -> RunTotals {
        self.files_seeded += other.files_seeded;
        self.files_failed += other.files_failed;
        self.locations_considered += other.locations_considered;
        self.locations_mutated += other.locations_mutated;
        self.bugs_written += other.bugs_written;
        self.write_failures += other.write_failures;
        for (rejection, count) in other.rejections {
            *self.rejections.entry(rejection).or_insert(0) += count;
        }
        self
    }
}

pub fn run(args: &SeedArgs, config: &BugSeedConfig) -> Result<serde_json::Value> {
    let start = Instant::now();
    let seeding = args.seeding_config(&config.seeding);
    let strategy = SeedingStrategy::from_config(&seeding)?;

    let patterns = load_patterns(&args.patterns)?;
    let (patterns, held_out) = split_training_validation(patterns, seeding.train_percent);
    info!(
        "Seeding with {} patterns ({} held out), strategy {}",
        patterns.len(),
        held_out.len(),
        strategy
    );

    let embedding = EmbeddingTable::load("token", &args.embedding)
        .with_context(|| format!("Failed to load {}", args.embedding.display()))?;
    let frequent = TopFrequent::load(
        args.frequent_identifiers.as_deref(),
        args.frequent_literals.as_deref(),
    )?;
    let files = collect_files(&args.inputs, "json")?;
    let writer = SeededFileWriter::new(&args.out_dir)?;

    let seeder = FileSeeder::new(strategy, &patterns, &embedding, &frequent)
        .with_max_locations(seeding.max_locations)
        .with_remove_subsumed(seeding.remove_subsumed);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.performance.num_threads)
        .build()
        .context("Failed to build thread pool")?;
    let pb = create_progress_bar(files.len() as u64, "Seeding bugs");

    let totals = pool.install(|| {
        files
            .par_iter()
            .enumerate()
            .map(|(index, path)| {
                let mut rng = StdRng::seed_from_u64(seeding.seed.wrapping_add(index as u64));
                let totals = seed_one(&seeder, &writer, path, &mut rng);
                pb.inc(1);
                totals
            })
            .reduce(RunTotals::default, RunTotals::merge)
    });
    pb.finish_with_message("Seeding complete");

    info!(
        "Wrote {} bugs from {} files in {:.2?}",
        totals.bugs_written,
        totals.files_seeded,
        start.elapsed()
    );
    Ok(serde_json::json!({
        "strategy": strategy.to_string(),
        "patterns": patterns.len(),
        "patterns_held_out": held_out.len(),
        "files": files.len(),
        "files_seeded": totals.files_seeded,
        "files_failed": totals.files_failed,
        "locations_considered": totals.locations_considered,
        "locations_mutated": totals.locations_mutated,
        "bugs_written": totals.bugs_written,
        "write_failures": totals.write_failures,
        "rejections": totals.rejections,
        "out_dir": writer.out_dir().display().to_string(),
        "elapsed_ms": start.elapsed().as_millis() as u64,
    }))
}

fn load_patterns(path: &Path) -> Result<Vec<bugseed_core::BugSeedingPattern>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let patterns = parse_patterns(&content)?;
    let total = patterns.len();
    let patterns = retain_placeholder_patterns(patterns);
    if patterns.len() < total {
        info!("Dropped {} patterns without identifiers or literals", total - patterns.len());
    }
    Ok(patterns)
}

/// Seeds one analysed file. Failures are logged and counted, never fatal.
fn seed_one(seeder: &FileSeeder<'_>, writer: &SeededFileWriter, path: &Path, rng: &mut StdRng) -> RunTotals {
    let mut totals = RunTotals::default();
    let report = match seeder.seed_path(path, rng) {
        Ok(report) => report,
        Err(e) => {
            warn!("Skipping {}: {}", path.display(), e);
            totals.files_failed = 1;
            return totals;
        }
    };

    totals.files_seeded = 1;
    totals.locations_considered = report.locations_considered;
    totals.locations_mutated = report.locations_mutated;
    totals.rejections = report.rejections;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "seeded".to_string());
    for bug in &report.bugs {
        match writer.write(&stem, bug) {
            Ok(_) => totals.bugs_written += 1,
            Err(e) => {
                warn!("Could not write bug for {}: {}", path.display(), e);
                totals.write_failures += 1;
            }
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use bugseed_core::ScopeOfSelection;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: SeedArgs,
    }

    #[test]
    fn test_flags_override_config() {
        let wrapper = Wrapper::try_parse_from([
            "seed", "in", "--patterns", "p.json", "--embedding", "e.json", "--out-dir", "out",
            "--strategy", "syntactic", "--scope", "file", "--seed", "7",
        ])
        .unwrap();
        let config = wrapper.args.seeding_config(&SeedingConfig::default());
        assert_eq!(config.strategy, "syntactic");
        assert_eq!(config.scope, ScopeOfSelection::File);
        assert_eq!(config.seed, 7);
        assert_eq!(config.k, SeedingConfig::default().k);
    }

    #[test]
    fn test_totals_merge() {
        let mut a = RunTotals {
            files_seeded: 1,
            bugs_written: 2,
            ..RunTotals::default()
        };
        a.rejections.insert(SeedingRejection::PatternMismatch, 3);
        let mut b = RunTotals {
            files_failed: 1,
            ..RunTotals::default()
        };
        b.rejections.insert(SeedingRejection::PatternMismatch, 1);
        let merged = a.merge(b);
        assert_eq!(merged.files_seeded, 1);
        assert_eq!(merged.files_failed, 1);
        assert_eq!(merged.bugs_written, 2);
        assert_eq!(merged.rejections[&SeedingRejection::PatternMismatch], 4);
    }
}
