use anyhow::{Context, Result};
use bugseed_core::{BugSeedConfig, ConfigManager, LoggingConfig, ScopeOfSelection};
use bugseed_learning::BugClass;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod dataset;
mod patterns;
mod progress;
mod seed;
mod vectorize;

#[derive(Parser)]
#[command(name = "bugseed")]
#[command(about = "BugSeed CLI - Seed realistic bugs and build training data for bug detectors", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (json, pretty)
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Configuration file (defaults to ./.bugseed.toml, then ~/.bugseed/config.toml)
    #[arg(short, long, global = true, env = "BUGSEED_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum BugClassArg {
    /// Swapped binary operators
    Operator,
    /// Wrong binary operands
    Operand,
    /// Wrong assignment right-hand sides
    Assignment,
}

impl From<BugClassArg> for BugClass {
    fn from(arg: BugClassArg) -> Self {
        match arg {
            BugClassArg::Operator => BugClass::SwappedBinOperator,
            BugClassArg::Operand => BugClass::WrongBinOperand,
            BugClassArg::Assignment => BugClass::WrongAssignment,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum ScopeArg {
    Function,
    File,
    TopK,
}

impl From<ScopeArg> for ScopeOfSelection {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Function => ScopeOfSelection::Function,
            ScopeArg::File => ScopeOfSelection::File,
            ScopeArg::TopK => ScopeOfSelection::TopK,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Turn extracted code locations into a training set
    Vectorize(vectorize::VectorizeArgs),

    /// Seed bugs into analysed source files
    Seed(seed::SeedArgs),

    /// Pair records from seeded files with their original locations
    Dataset(dataset::DatasetArgs),

    /// Bug-seeding pattern utilities
    #[command(subcommand)]
    Patterns(patterns::PatternCommands),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Where to write the file
        #[arg(short, long, default_value = ".bugseed.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // `config init` must work before any configuration exists
    if let Commands::Config(ConfigCommands::Init { path, force }) = &cli.command {
        init_logging(&LoggingConfig::default(), cli.verbose);
        return match init_config(path, *force) {
            Ok(output) => print_output(&cli.output, &output),
            Err(e) => exit_with(e),
        };
    }

    let manager = ConfigManager::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&manager.config().logging, cli.verbose);

    match execute_command(&cli, &manager) {
        Ok(output) => {
            print_output(&cli.output, &output)?;
            Ok(())
        }
        Err(e) => exit_with(e),
    }
}

fn exit_with(e: anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), e);
    std::process::exit(1);
}

fn init_logging(config: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    match config.format.as_str() {
        "json" => registry.with(layer.json()).init(),
        "compact" => registry.with(layer.compact()).init(),
        _ => registry.with(layer).init(),
    }
}

fn execute_command(cli: &Cli, manager: &ConfigManager) -> Result<serde_json::Value> {
    let config = manager.config();
    match &cli.command {
        Commands::Vectorize(args) => vectorize::run(args, config),
        Commands::Seed(args) => seed::run(args, config),
        Commands::Dataset(args) => dataset::run(args),
        Commands::Patterns(cmd) => patterns::run(cmd, config),
        Commands::Config(ConfigCommands::Show) => show_config(manager),
        Commands::Config(ConfigCommands::Init { path, force }) => init_config(path, *force),
    }
}

fn init_config(path: &Path, force: bool) -> Result<serde_json::Value> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    ConfigManager::create_default_config(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(serde_json::json!({
        "status": "created",
        "path": path.display().to_string(),
    }))
}

fn show_config(manager: &ConfigManager) -> Result<serde_json::Value> {
    let config: &BugSeedConfig = manager.config();
    let mut value = serde_json::to_value(config)?;
    if let serde_json::Value::Object(map) = &mut value {
        let source = manager
            .config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "defaults".to_string());
        map.insert("source".to_string(), serde_json::Value::String(source));
    }
    Ok(value)
}

fn print_output(format: &OutputFormat, value: &serde_json::Value) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Pretty => {
            print_pretty(value, 0)?;
        }
    }
    Ok(())
}

fn print_pretty(value: &serde_json::Value, indent: usize) -> Result<()> {
    let pad = "  ".repeat(indent);
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let key_colored = key.cyan().bold();
                match val {
                    serde_json::Value::String(s) => {
                        println!("{}{}: {}", pad, key_colored, s.green());
                    }
                    serde_json::Value::Number(n) => {
                        println!("{}{}: {}", pad, key_colored, n.to_string().yellow());
                    }
                    serde_json::Value::Bool(b) => {
                        let val_colored = if *b { "true".green() } else { "false".red() };
                        println!("{}{}: {}", pad, key_colored, val_colored);
                    }
                    serde_json::Value::Object(_) => {
                        println!("{}{}:", pad, key_colored);
                        print_pretty(val, indent + 1)?;
                    }
                    _ => {
                        println!("{}{}: {}", pad, key_colored, val);
                    }
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                println!("\n{}{}{}:", pad, "Item ".cyan(), (i + 1).to_string().yellow());
                print_pretty(item, indent + 1)?;
            }
        }
        _ => {
            println!("{}{}", pad, serde_json::to_string_pretty(value)?);
        }
    }
    Ok(())
}
