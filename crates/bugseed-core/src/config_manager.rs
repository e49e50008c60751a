use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for crate::BugSeedError {
    fn from(err: ConfigError) -> Self {
        crate::BugSeedError::Config(err.to_string())
    }
}

/// Main configuration for a BugSeed run
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BugSeedConfig {
    /// Pattern application settings
    #[serde(default)]
    pub seeding: SeedingConfig,

    /// Feature-vector construction settings
    #[serde(default)]
    pub learning: LearningConfig,

    /// Worker pool settings
    #[serde(default)]
    pub performance: PerformanceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where unbound tokens are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScopeOfSelection {
    /// Tokens of the function enclosing the target
    Function,
    /// Tokens of the whole file
    File,
    /// File tokens plus the most frequent tokens of the training commits
    #[default]
    TopK,
}

impl FromStr for ScopeOfSelection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "function" => Ok(Self::Function),
            "file" => Ok(Self::File),
            "top_k" | "top-k" => Ok(Self::TopK),
            other => Err(ConfigError::ValidationError(format!(
                "Invalid scope of selection: {}. Must be one of: function, file, top_k",
                other
            ))),
        }
    }
}

impl fmt::Display for ScopeOfSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Function => "function",
            Self::File => "file",
            Self::TopK => "top_k",
        };
        f.write_str(name)
    }
}

/// Bug seeding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedingConfig {
    /// "semantic" or "syntactic"
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Minimum mean cosine similarity for a semantic match (0.0 - 1.0)
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Number of candidates kept per unbound token
    #[serde(default = "default_k")]
    pub k: usize,

    /// Scope the unbound tokens are selected from
    #[serde(default)]
    pub scope: ScopeOfSelection,

    /// Maximum number of locations tried per file (None = all)
    #[serde(default)]
    pub max_locations: Option<usize>,

    /// Drop locations nested inside another mutable location
    #[serde(default = "default_true")]
    pub remove_subsumed: bool,

    /// Share of patterns used for seeding, the rest is held out
    #[serde(default = "default_train_percent")]
    pub train_percent: u8,

    /// Random seed for location shuffling
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            similarity_threshold: default_similarity_threshold(),
            k: default_k(),
            scope: ScopeOfSelection::default(),
            max_locations: None,
            remove_subsumed: true,
            train_percent: default_train_percent(),
            seed: default_seed(),
        }
    }
}

/// Feature-vector construction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Length of a type embedding
    #[serde(default = "default_type_embedding_size")]
    pub type_embedding_size: usize,

    /// Length of an AST node-type embedding
    #[serde(default = "default_node_type_embedding_size")]
    pub node_type_embedding_size: usize,

    /// Random seed for synthesizing incorrect examples
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            type_embedding_size: default_type_embedding_size(),
            node_type_embedding_size: default_node_type_embedding_size(),
            seed: default_seed(),
        }
    }
}

/// Performance and resource configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Number of worker threads
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            num_threads: default_num_threads(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

// Default value functions
fn default_strategy() -> String {
    "semantic".to_string()
}
fn default_similarity_threshold() -> f32 {
    0.3
}
fn default_k() -> usize {
    1
}
fn default_true() -> bool {
    true
}
fn default_train_percent() -> u8 {
    80
}
fn default_seed() -> u64 {
    42
}
fn default_type_embedding_size() -> usize {
    5
}
fn default_node_type_embedding_size() -> usize {
    8
}
fn default_num_threads() -> usize {
    num_cpus::get()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

/// Configuration manager with file discovery and env overrides
pub struct ConfigManager {
    config: BugSeedConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (explicit path, ./.bugseed.toml, ~/.bugseed/config.toml)
    /// 3. Defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_dotenv();

        let (config, config_path) = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.display().to_string()));
                }
                (Self::read_toml_file(path)?, Some(path.to_path_buf()))
            }
            None => Self::load_config_file()?,
        };

        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        match config_path {
            Some(ref path) => info!("Config file: {}", path.display()),
            None => info!("Config file: none (using defaults)"),
        }
        info!(
            "Seeding: strategy={} threshold={} k={} scope={}",
            config.seeding.strategy,
            config.seeding.similarity_threshold,
            config.seeding.k,
            config.seeding.scope
        );

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Wrap an already built configuration
    pub fn from_config(config: BugSeedConfig) -> Result<Self, ConfigError> {
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            }
        }
    }

    /// Search order:
    /// 1. ./.bugseed.toml
    /// 2. ~/.bugseed/config.toml
    /// 3. Defaults
    fn load_config_file() -> Result<(BugSeedConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".bugseed.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".bugseed").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        Ok((BugSeedConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<BugSeedConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn apply_env_overrides(mut config: BugSeedConfig) -> BugSeedConfig {
        if let Ok(strategy) = std::env::var("BUGSEED_STRATEGY") {
            config.seeding.strategy = strategy;
        }
        if let Ok(threshold) = std::env::var("BUGSEED_SIMILARITY_THRESHOLD") {
            if let Ok(t) = threshold.parse() {
                config.seeding.similarity_threshold = t;
            }
        }
        if let Ok(k) = std::env::var("BUGSEED_K") {
            if let Ok(k) = k.parse() {
                config.seeding.k = k;
            }
        }
        if let Ok(scope) = std::env::var("BUGSEED_SCOPE") {
            match scope.parse() {
                Ok(scope) => config.seeding.scope = scope,
                Err(e) => warn!("Ignoring BUGSEED_SCOPE: {}", e),
            }
        }
        if let Ok(max) = std::env::var("BUGSEED_MAX_LOCATIONS") {
            if let Ok(max) = max.parse() {
                config.seeding.max_locations = Some(max);
            }
        }
        if let Ok(seed) = std::env::var("BUGSEED_SEED") {
            if let Ok(seed) = seed.parse() {
                config.seeding.seed = seed;
                config.learning.seed = seed;
            }
        }
        if let Ok(threads) = std::env::var("BUGSEED_NUM_THREADS") {
            if let Ok(n) = threads.parse() {
                config.performance.num_threads = n;
            }
        }

        // Logging; directive lists like "bugseed=debug" are left to the EnvFilter
        if let Ok(level) = std::env::var("RUST_LOG") {
            if LOG_LEVELS.contains(&level.as_str()) {
                config.logging.level = level;
            }
        }

        config
    }

    fn validate_config(config: &BugSeedConfig) -> Result<(), ConfigError> {
        match config.seeding.strategy.as_str() {
            "semantic" | "syntactic" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid seeding strategy: {}. Must be one of: semantic, syntactic",
                    other
                )))
            }
        }

        let threshold = config.seeding.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::ValidationError(format!(
                "Similarity threshold must be within 0.0 - 1.0, got {}",
                threshold
            )));
        }

        if config.seeding.k == 0 {
            return Err(ConfigError::ValidationError(
                "k must be at least 1".to_string(),
            ));
        }

        if config.seeding.train_percent > 100 {
            return Err(ConfigError::ValidationError(format!(
                "train_percent must be at most 100, got {}",
                config.seeding.train_percent
            )));
        }

        if config.performance.num_threads == 0 {
            return Err(ConfigError::ValidationError(
                "num_threads must be at least 1".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level: {}. Must be one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        match config.logging.format.as_str() {
            "pretty" | "json" | "compact" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, json, compact",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &BugSeedConfig {
        &self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Create a default config file
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let config = BugSeedConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        }

        std::fs::write(path, toml_str).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Ok(())
    }
}
