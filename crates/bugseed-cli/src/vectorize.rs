use anyhow::{Context, Result};
use bugseed_core::{collect_files, BugSeedConfig};
use bugseed_learning::{
    AssignmentVectorizer, BinOperatorVectorizer, BinaryOperandVectorizer, BugClass, DataReader,
    Vectorizer,
};
use bugseed_vector::{EmbeddingLookup, EmbeddingOracles};
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::BugClassArg;

#[derive(Args)]
pub struct VectorizeArgs {
    /// Bug class to build examples for
    #[arg(short, long, value_enum)]
    bug_class: BugClassArg,

    /// Training record files or directories
    #[arg(long, required = true, num_args = 1..)]
    training: Vec<PathBuf>,

    /// Validation record files or directories
    #[arg(long, num_args = 1..)]
    validation: Vec<PathBuf>,

    /// Name embedding (JSON object of token -> vector)
    #[arg(long)]
    names: PathBuf,

    /// Type embedding
    #[arg(long)]
    types: PathBuf,

    /// Node-type embedding
    #[arg(long)]
    node_types: PathBuf,

    /// Where to write the training set
    #[arg(long)]
    out: PathBuf,

    /// Where to write the validation set
    #[arg(long)]
    validation_out: Option<PathBuf>,

    /// Random seed, overrides learning.seed
    #[arg(long)]
    seed: Option<u64>,
}

pub fn run(args: &VectorizeArgs, config: &BugSeedConfig) -> Result<serde_json::Value> {
    let oracles = EmbeddingOracles::load(&args.names, &args.types, &args.node_types)
        .context("Failed to load embeddings")?;
    let type_dim = EmbeddingLookup::dimension(&oracles.types);
    if type_dim != 0 && type_dim != config.learning.type_embedding_size {
        warn!(
            "Type embedding has {} dimensions, configuration says {}; unseen types use {}",
            type_dim, config.learning.type_embedding_size, type_dim
        );
    }
    let node_dim = EmbeddingLookup::dimension(&oracles.node_types);
    if node_dim != 0 && node_dim != config.learning.node_type_embedding_size {
        warn!(
            "Node-type embedding has {} dimensions, configuration says {}",
            node_dim, config.learning.node_type_embedding_size
        );
    }

    let training = collect_files(&args.training, "json")?;
    let validation = collect_files(&args.validation, "json")?;
    let seed = args.seed.unwrap_or(config.learning.seed);

    match BugClass::from(args.bug_class) {
        BugClass::SwappedBinOperator => {
            let vectorizer = BinOperatorVectorizer::new(&config.learning);
            run_with(vectorizer, args, &training, &validation, &oracles, seed)
        }
        BugClass::WrongBinOperand => {
            let vectorizer = BinaryOperandVectorizer::new(&config.learning);
            run_with(vectorizer, args, &training, &validation, &oracles, seed)
        }
        BugClass::WrongAssignment => {
            let vectorizer = AssignmentVectorizer::new(&config.learning);
            run_with(vectorizer, args, &training, &validation, &oracles, seed)
        }
    }
}

fn run_with<V: Vectorizer>(
    mut vectorizer: V,
    args: &VectorizeArgs,
    training: &[PathBuf],
    validation: &[PathBuf],
    oracles: &EmbeddingOracles,
    seed: u64,
) -> Result<serde_json::Value> {
    let start = Instant::now();
    let observed = vectorizer.prescan(training, validation);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut splits = serde_json::Map::new();
    splits.insert(
        "training".to_string(),
        vectorize_split(&vectorizer, training, oracles, &mut rng, &args.out)?,
    );
    if let Some(out) = &args.validation_out {
        splits.insert(
            "validation".to_string(),
            vectorize_split(&vectorizer, validation, oracles, &mut rng, out)?,
        );
    }

    info!("Vectorized in {:.2?}", start.elapsed());
    Ok(serde_json::json!({
        "bug_class": BugClass::from(args.bug_class).to_string(),
        "records_observed": observed,
        "seed": seed,
        "splits": splits,
        "elapsed_ms": start.elapsed().as_millis() as u64,
    }))
}

fn vectorize_split<V: Vectorizer>(
    vectorizer: &V,
    files: &[PathBuf],
    oracles: &EmbeddingOracles,
    rng: &mut StdRng,
    out: &Path,
) -> Result<serde_json::Value> {
    let reader = DataReader::new(files.iter().cloned());
    let (set, stats) = vectorizer.vectorize(&reader, oracles, rng);
    info!("{} -> {}", stats, out.display());
    set.save(out)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(serde_json::json!({
        "files": files.len(),
        "examples": set.len(),
        "dimension": set.dimension(),
        "out": out.display().to_string(),
        "stats": stats,
    }))
}
