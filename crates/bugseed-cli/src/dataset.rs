use anyhow::{Context, Result};
use bugseed_core::{collect_files, AssignmentRecord, BinOpRecord, CodeLocation};
use bugseed_learning::{DataReader, SeededDataset};
use clap::Args;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::BugClassArg;

#[derive(Args)]
pub struct DatasetArgs {
    /// Bug class of the records
    #[arg(short, long, value_enum)]
    bug_class: BugClassArg,

    /// Record files extracted from original and seeded code
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Where to write the `[correct, incorrect]` pairs
    #[arg(long)]
    out: PathBuf,
}

pub fn run(args: &DatasetArgs) -> Result<serde_json::Value> {
    let files = collect_files(&args.inputs, "json")?;
    let reader = DataReader::new(files);
    match args.bug_class {
        BugClassArg::Operator | BugClassArg::Operand => pair_records::<BinOpRecord>(&reader, &args.out),
        BugClassArg::Assignment => pair_records::<AssignmentRecord>(&reader, &args.out),
    }
}

fn pair_records<T>(reader: &DataReader, out: &Path) -> Result<serde_json::Value>
where
    T: CodeLocation + DeserializeOwned + Serialize + Clone,
{
    let mut dataset = SeededDataset::<T>::new();
    dataset.add_from(reader);
    if dataset.orphaned() > 0 {
        warn!("{} records from seeded files had no usable metadata", dataset.orphaned());
    }

    let pairs = dataset.pairs();
    std::fs::write(out, serde_json::to_string(&pairs)?)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    info!("Wrote {} pairs to {}", pairs.len(), out.display());

    Ok(serde_json::json!({
        "files": reader.paths().len(),
        "locations": dataset.location_count(),
        "orphaned": dataset.orphaned(),
        "pairs": pairs.len(),
        "out": out.display().to_string(),
    }))
}
