use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{SearchError, SearchResult};
use crate::search::WorkerCommand;

/// Configuration for a keyword scan.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations in order of precedence:
/// 1. Custom config file specified via `--config` flag
/// 2. Local `.keyscout.yaml` in the current directory
/// 3. Global `$HOME/.config/keyscout/config.yaml`
///
/// # Configuration Format
///
/// ```yaml
/// # Keywords to look for (case-insensitive substring match)
/// keywords: ["python", "data"]
///
/// # Directory whose direct children are scanned
/// root_path: "./corpus"
///
/// # Extensions treated as text files
/// file_extensions: ["txt"]
///
/// # Glob patterns excluded from the file set
/// ignore_patterns: ["**/draft_*.txt"]
///
/// # Isolation boundary: auto, process or thread
/// strategy: auto
///
/// # Override of the detected core count
/// cores: 8
///
/// # Upper bound on waiting for workers ("0s" waits forever)
/// worker_timeout: "5m"
///
/// # How to handle invalid UTF-8 (failfast, lossy)
/// encoding_mode: failfast
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
///
/// When using the CLI, command-line arguments take precedence over config file values.
/// The merging behavior is defined in the `merge_with_cli` method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Keywords to search for
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Directory to scan (non-recursive)
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// File extensions that make up the file set
    #[serde(default = "default_file_extensions")]
    pub file_extensions: Vec<String>,

    /// Patterns to ignore (supports glob syntax)
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Which isolation boundary to use for workers
    #[serde(default)]
    pub strategy: StrategyChoice,

    /// Number of cores to plan for.
    /// Defaults to the detected number of CPU cores if not specified
    #[serde(default)]
    pub cores: Option<NonZeroUsize>,

    /// How long the aggregator waits for all workers, in humantime syntax
    #[serde(default = "default_worker_timeout")]
    pub worker_timeout: String,

    /// How to handle invalid UTF-8 sequences in files
    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Program that runs process-isolated workers. When unset, the
    /// `keyscout-worker` binary next to the current executable is used if present.
    #[serde(skip)]
    pub worker_command: Option<WorkerCommand>,
}

/// Requested isolation boundary for workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyChoice {
    /// Decide from the number of available cores
    #[default]
    Auto,
    /// Always run workers as child processes
    Process,
    /// Always run workers as threads
    Thread,
}

/// Encoding behavior when reading files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Invalid UTF-8 makes the file unreadable
    #[default]
    FailFast,
    /// Invalid sequences are replaced and the file is still searched
    Lossy,
}

impl std::str::FromStr for StrategyChoice {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "process" => Ok(Self::Process),
            "thread" => Ok(Self::Thread),
            other => Err(SearchError::config_error(format!(
                "Unknown strategy '{}', expected auto, process or thread",
                other
            ))),
        }
    }
}

impl std::str::FromStr for EncodingMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "failfast" => Ok(Self::FailFast),
            "lossy" => Ok(Self::Lossy),
            other => Err(SearchError::config_error(format!(
                "Unknown encoding mode '{}', expected failfast or lossy",
                other
            ))),
        }
    }
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_file_extensions() -> Vec<String> {
    vec!["txt".to_string()]
}

fn default_worker_timeout() -> String {
    "300s".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            root_path: default_root_path(),
            file_extensions: default_file_extensions(),
            ignore_patterns: Vec::new(),
            strategy: StrategyChoice::default(),
            cores: None,
            worker_timeout: default_worker_timeout(),
            encoding_mode: EncodingMode::default(),
            log_level: default_log_level(),
            worker_command: None,
        }
    }
}

impl ScanConfig {
    /// Creates a config for the given directory and keywords, all else default
    pub fn new(root_path: impl Into<PathBuf>, keywords: Vec<String>) -> Self {
        Self {
            keywords,
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("keyscout/config.yaml")),
            Some(PathBuf::from(".keyscout.yaml")),
            config_path.map(PathBuf::from),
        ];

        for path in config_files.iter().flatten() {
            // An explicit path must exist; the defaults are optional
            let required = config_path.is_some_and(|p| p == path.as_path());
            if required || path.exists() {
                builder = builder.add_source(File::from(path.as_path()).required(required));
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli_config: ScanConfig) -> Self {
        if !cli_config.keywords.is_empty() {
            self.keywords = cli_config.keywords;
        }
        if cli_config.root_path != default_root_path() {
            self.root_path = cli_config.root_path;
        }
        if cli_config.file_extensions != default_file_extensions() {
            self.file_extensions = cli_config.file_extensions;
        }
        if !cli_config.ignore_patterns.is_empty() {
            self.ignore_patterns = cli_config.ignore_patterns;
        }
        if cli_config.strategy != StrategyChoice::Auto {
            self.strategy = cli_config.strategy;
        }
        if cli_config.cores.is_some() {
            self.cores = cli_config.cores;
        }
        if cli_config.worker_timeout != default_worker_timeout() {
            self.worker_timeout = cli_config.worker_timeout;
        }
        if cli_config.encoding_mode != EncodingMode::FailFast {
            self.encoding_mode = cli_config.encoding_mode;
        }
        if cli_config.log_level != default_log_level() {
            self.log_level = cli_config.log_level;
        }
        if cli_config.worker_command.is_some() {
            self.worker_command = cli_config.worker_command;
        }
        self
    }

    /// Number of cores the run plans for
    pub fn available_cores(&self) -> usize {
        self.cores.map_or_else(num_cpus::get, NonZeroUsize::get)
    }

    /// Parsed worker timeout; `None` means wait without bound
    pub fn worker_timeout(&self) -> SearchResult<Option<Duration>> {
        let timeout = humantime::parse_duration(self.worker_timeout.trim()).map_err(|e| {
            SearchError::config_error(format!(
                "Invalid worker_timeout '{}': {}",
                self.worker_timeout, e
            ))
        })?;
        Ok((!timeout.is_zero()).then_some(timeout))
    }
}
