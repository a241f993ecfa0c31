use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::concurrent::DEFAULT_SHARDS;
use crate::error::{IndexError, IndexResult};

/// Configuration file used when none is given on the command line
pub const DEFAULT_CONFIG_FILE: &str = "config.dat";

/// Files at or above this many bytes are skipped
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10_000_000;

/// Keys a `key=value` configuration file must define
pub const LEGACY_COMPULSORY_KEYS: [&str; 8] = [
    "indir",
    "out_by_value",
    "out_by_name",
    "indexing_threads",
    "merging_threads",
    "max_names_queue_size",
    "max_files_queue_size",
    "max_words_queue_size",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub indexer: IndexerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input directory and report destinations. All three are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory tree to index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indir: Option<PathBuf>,

    /// Report sorted alphabetically by word
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_by_name: Option<PathBuf>,

    /// Report sorted by ascending count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_by_value: Option<PathBuf>,
}

/// Resolved, required paths for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub indir: PathBuf,
    pub out_by_name: PathBuf,
    pub out_by_value: PathBuf,
}

/// How indexer output reaches the shared map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IndexStrategy {
    /// Every indexer increments the sharded map directly
    #[default]
    Shared,
    /// Indexers emit per-file partial counts that merger threads fold in
    Merge,
}

impl fmt::Display for IndexStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => write!(f, "shared"),
            Self::Merge => write!(f, "merge"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Number of indexing threads
    #[serde(default = "default_indexing_threads")]
    pub indexing_threads: usize,

    /// Number of merging threads (merge strategy only)
    #[serde(default = "default_merging_threads")]
    pub merging_threads: usize,

    /// Capacity of the path queue between enumerator and loader
    #[serde(default = "default_names_queue_capacity", alias = "max_names_queue_size")]
    pub names_queue_capacity: usize,

    /// Capacity of the raw file queue between loader and indexers
    #[serde(default = "default_files_queue_capacity", alias = "max_files_queue_size")]
    pub files_queue_capacity: usize,

    /// Capacity of the partial count queue between indexers and mergers
    #[serde(default = "default_words_queue_capacity", alias = "max_words_queue_size")]
    pub words_queue_capacity: usize,

    /// Files of this size or larger are skipped
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Number of shards in the word map (power of two)
    #[serde(default = "default_shard_count")]
    pub shard_count: usize,

    #[serde(default)]
    pub strategy: IndexStrategy,

    /// Follow symbolic links while walking the input tree
    #[serde(default)]
    pub follow_links: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            indexing_threads: default_indexing_threads(),
            merging_threads: default_merging_threads(),
            names_queue_capacity: default_names_queue_capacity(),
            files_queue_capacity: default_files_queue_capacity(),
            words_queue_capacity: default_words_queue_capacity(),
            max_file_size: default_max_file_size(),
            shard_count: default_shard_count(),
            strategy: IndexStrategy::default(),
            follow_links: false,
        }
    }
}

impl IndexerConfig {
    /// Reject settings that would leave a stage unable to run.
    pub fn validate(&self) -> IndexResult<()> {
        let positive = [
            ("indexing_threads", self.indexing_threads),
            ("merging_threads", self.merging_threads),
            ("max_names_queue_size", self.names_queue_capacity),
            ("max_files_queue_size", self.files_queue_capacity),
            ("max_words_queue_size", self.words_queue_capacity),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(IndexError::Config(format!("{key} must be at least 1")));
            }
        }
        if !self.shard_count.is_power_of_two() {
            return Err(IndexError::Config(format!(
                "shard_count must be a power of two, got {}",
                self.shard_count
            )));
        }
        Ok(())
    }
}

fn default_indexing_threads() -> usize {
    num_cpus::get()
}

fn default_merging_threads() -> usize {
    1
}

fn default_names_queue_capacity() -> usize {
    1024
}

fn default_files_queue_capacity() -> usize {
    64
}

fn default_words_queue_capacity() -> usize {
    256
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_shard_count() -> usize {
    DEFAULT_SHARDS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write logs to rotating files
    #[serde(default)]
    pub enabled: bool,

    /// Write logs to stderr
    #[serde(default = "default_true")]
    pub stderr: bool,

    /// Level for the file layer: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log directory (relative paths resolve against the config file's directory)
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    /// hourly, daily, minutely or never
    #[serde(default = "default_rotation")]
    pub rotation: String,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            stderr: true,
            level: default_log_level(),
            directory: default_log_directory(),
            rotation: default_rotation(),
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_rotation() -> String {
    "daily".to_string()
}

fn default_file_prefix() -> String {
    "wordindex.log".to_string()
}

impl Config {
    /// Load configuration from `path`.
    ///
    /// Files ending in `.toml` are parsed as TOML; anything else is read as
    /// `key=value` lines, one setting per line.
    pub fn load(path: &Path) -> IndexResult<Self> {
        if !path.exists() {
            return Err(IndexError::NotFound(format!(
                "configuration file {}",
                path.display()
            )));
        }

        let content =
            std::fs::read_to_string(path).map_err(|err| IndexError::io(path, err))?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let config = if is_toml {
            toml::from_str(&content).map_err(|err| {
                IndexError::Config(format!("failed to parse {}: {}", path.display(), err))
            })?
        } else {
            Self::from_key_values(&content)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse `key=value` lines. Surrounding double quotes are stripped from
    /// values; lines without `=` are ignored. Every key in
    /// [`LEGACY_COMPULSORY_KEYS`] must be present.
    pub fn from_key_values(content: &str) -> IndexResult<Self> {
        let mut values: HashMap<&str, String> = HashMap::new();
        for line in content.lines() {
            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim().replace('"', "");
                values.insert(key.trim(), value);
            }
        }

        if let Some(key) = LEGACY_COMPULSORY_KEYS
            .iter()
            .find(|key| !values.contains_key(*key))
        {
            return Err(missing_key(key));
        }

        let mut config = Config::default();
        for (key, value) in values {
            match key {
                "indir" => config.paths.indir = Some(PathBuf::from(value)),
                "out_by_name" => config.paths.out_by_name = Some(PathBuf::from(value)),
                "out_by_value" => config.paths.out_by_value = Some(PathBuf::from(value)),
                "indexing_threads" => config.indexer.indexing_threads = parse_value(key, &value)?,
                "merging_threads" => config.indexer.merging_threads = parse_value(key, &value)?,
                "max_names_queue_size" => {
                    config.indexer.names_queue_capacity = parse_value(key, &value)?
                }
                "max_files_queue_size" => {
                    config.indexer.files_queue_capacity = parse_value(key, &value)?
                }
                "max_words_queue_size" => {
                    config.indexer.words_queue_capacity = parse_value(key, &value)?
                }
                "max_file_size" => config.indexer.max_file_size = parse_value(key, &value)?,
                "shard_count" => config.indexer.shard_count = parse_value(key, &value)?,
                "strategy" => {
                    config.indexer.strategy = match value.as_str() {
                        "shared" => IndexStrategy::Shared,
                        "merge" => IndexStrategy::Merge,
                        other => {
                            return Err(IndexError::Config(format!(
                                "unknown strategy '{other}', expected 'shared' or 'merge'"
                            )))
                        }
                    }
                }
                other => warn!("Ignoring unknown configuration key '{}'", other),
            }
        }
        Ok(config)
    }

    /// Check value ranges. Path presence is checked by [`Config::run_paths`].
    pub fn validate(&self) -> IndexResult<()> {
        self.indexer.validate()
    }

    /// The three required paths, or a configuration error naming the first
    /// missing key.
    pub fn run_paths(&self) -> IndexResult<RunPaths> {
        fn required(value: &Option<PathBuf>, key: &str) -> IndexResult<PathBuf> {
            value.clone().ok_or_else(|| missing_key(key))
        }

        Ok(RunPaths {
            indir: required(&self.paths.indir, "indir")?,
            out_by_name: required(&self.paths.out_by_name, "out_by_name")?,
            out_by_value: required(&self.paths.out_by_value, "out_by_value")?,
        })
    }

    /// Write this configuration as TOML
    pub fn save(&self, path: &Path) -> IndexResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| IndexError::io(parent, err))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|err| IndexError::Config(format!("failed to serialize config: {err}")))?;

        std::fs::write(path, content).map_err(|err| IndexError::io(path, err))
    }

    /// A starter configuration with example paths filled in
    pub fn template() -> Self {
        Self {
            paths: PathsConfig {
                indir: Some(PathBuf::from("data")),
                out_by_name: Some(PathBuf::from("out/by_name.txt")),
                out_by_value: Some(PathBuf::from("out/by_value.txt")),
            },
            ..Default::default()
        }
    }
}

fn missing_key(key: &str) -> IndexError {
    IndexError::Config(format!(
        "there is no compulsory key {key} in the configuration file"
    ))
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> IndexResult<T> {
    value
        .parse()
        .map_err(|_| IndexError::Config(format!("invalid value '{value}' for {key}")))
}
