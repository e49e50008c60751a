use anyhow::{Context, Result};
use bugseed_core::{
    parse_patterns, split_training_validation, wrong_binary_operand_patterns, BugSeedConfig,
    BugSeedingPattern,
};
use clap::Subcommand;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Subcommand)]
pub enum PatternCommands {
    /// Keep patterns that can be seeded, optionally only wrong-operand ones
    Filter {
        /// Mined patterns (JSON array)
        input: PathBuf,

        /// Where to write the kept patterns
        #[arg(long)]
        out: PathBuf,

        /// Keep only binary expressions that swap one operand
        #[arg(long)]
        wrong_binary_operand: bool,
    },

    /// Split patterns into a seeding part and a held-out part
    Split {
        /// Mined patterns (JSON array)
        input: PathBuf,

        #[arg(long)]
        train_out: PathBuf,

        #[arg(long)]
        validation_out: PathBuf,

        /// Share used for seeding, overrides seeding.train_percent
        #[arg(long)]
        train_percent: Option<u8>,
    },
}

pub fn run(cmd: &PatternCommands, config: &BugSeedConfig) -> Result<serde_json::Value> {
    match cmd {
        PatternCommands::Filter {
            input,
            out,
            wrong_binary_operand,
        } => {
            let patterns = read(input)?;
            let total = patterns.len();
            let kept = if *wrong_binary_operand {
                wrong_binary_operand_patterns(&patterns)
            } else {
                bugseed_core::retain_placeholder_patterns(patterns)
            };
            write(out, &kept)?;
            info!("Kept {} of {} patterns", kept.len(), total);
            Ok(serde_json::json!({
                "read": total,
                "kept": kept.len(),
                "out": out.display().to_string(),
            }))
        }
        PatternCommands::Split {
            input,
            train_out,
            validation_out,
            train_percent,
        } => {
            let percent = train_percent.unwrap_or(config.seeding.train_percent);
            let (train, validation) = split_training_validation(read(input)?, percent);
            write(train_out, &train)?;
            write(validation_out, &validation)?;
            Ok(serde_json::json!({
                "train_percent": percent,
                "training": train.len(),
                "validation": validation.len(),
            }))
        }
    }
}

fn read(path: &Path) -> Result<Vec<BugSeedingPattern>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(parse_patterns(&content)?)
}

fn write(path: &Path, patterns: &[BugSeedingPattern]) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(patterns)?)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PATTERNS: &str = r#"[
      {"fix": ["Idf_1", "<", "Idf_2"], "fix_actual": ["i", "<", "n"],
       "buggy": ["Idf_1", "<", "Idf_3"], "buggy_actual": ["i", "<", "m"],
       "url": "u1", "fix_tokenType": "BinaryExpression", "buggy_tokenType": "BinaryExpression"},
      {"fix": ["return", ";"], "fix_actual": ["return", ";"],
       "buggy": ["break", ";"], "buggy_actual": ["break", ";"], "url": "u2"}
    ]"#;

    #[test]
    fn test_filter_and_split() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("patterns.json");
        std::fs::write(&input, PATTERNS).unwrap();
        let config = BugSeedConfig::default();

        let out = dir.path().join("kept.json");
        let summary = run(
            &PatternCommands::Filter {
                input: input.clone(),
                out: out.clone(),
                wrong_binary_operand: false,
            },
            &config,
        )
        .unwrap();
        assert_eq!(summary["read"], 2);
        assert_eq!(summary["kept"], 1);
        assert_eq!(read(&out).unwrap()[0].url, "u1");

        let summary = run(
            &PatternCommands::Split {
                input,
                train_out: dir.path().join("train.json"),
                validation_out: dir.path().join("validation.json"),
                train_percent: Some(50),
            },
            &config,
        )
        .unwrap();
        assert_eq!(summary["training"], 1);
        assert_eq!(summary["validation"], 1);
    }
}
