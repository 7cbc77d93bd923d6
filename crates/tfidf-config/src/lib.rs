//! Configuration system for tfidf.
//!
//! tfidf uses TOML configuration files named `.tfidf.toml`. Configuration is resolved by
//! walking up the directory tree from the current working directory, collecting any
//! `.tfidf.toml` files found, then loading `~/.tfidf.toml` as the global config with lowest
//! precedence.
//!
//! The merged [`Config`] holds defaults for a run. A [`RunConfig`] combines it with the
//! per-invocation input and output locations plus any command-line overrides, and is the
//! only configuration type the pipeline itself consumes.

#![warn(missing_docs)]

mod discovery;
mod error;
mod merge;
mod parse;
mod templates;
#[cfg(test)]
mod test_support;
mod validate;

use std::path::{Path, PathBuf};

pub use discovery::{CONFIG_FILENAME, discover_config_files, global_config_path, is_global_config};
pub use error::ConfigError;
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{
    RawConfig, RawEngineSettings, RawPipelineSettings, parse_config_file, parse_config_str,
};
use serde::{Deserialize, Serialize};
pub use templates::config_template;
pub use validate::{ConfigWarning, validate_run};

/// Default number of top-frequency terms per document.
pub const DEFAULT_TOP_N: usize = 5;

/// Default number of reduce partitions per stage.
pub const DEFAULT_REDUCE_TASKS: usize = 1;

/// Default attempts per task before a stage fails.
pub const DEFAULT_MAX_TASK_ATTEMPTS: usize = 4;

/// Top-level merged configuration for tfidf.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Pipeline settings.
    pub pipeline: PipelineSettings,
    /// Execution engine settings.
    pub engine: EngineSettings,
    /// Directory containing the most specific config file.
    pub config_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration by discovering and merging all relevant `.tfidf.toml` files.
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_files = discover_config_files(cwd);
        Self::load_from_files(&config_files)
    }

    /// Loads configuration from a specific list of config file paths.
    ///
    /// Files should be provided in precedence order: highest precedence first.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let parsed = files
            .iter()
            .map(|path| {
                let config = parse_config_file(path)?;
                Ok(ParsedConfig {
                    path: path.clone(),
                    config,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(merge_configs(&parsed))
    }

    /// Serializes the effective settings to TOML format.
    pub fn settings_to_toml(&self) -> Result<String, toml::ser::Error> {
        let serializable = SerializableSettings {
            pipeline: self.pipeline.clone(),
            engine: self.engine.clone(),
        };
        toml::to_string_pretty(&serializable)
    }
}

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Number of top-frequency terms reported per document.
    pub top_n: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Settings for the local execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Number of reduce partitions per stage.
    pub reduce_tasks: usize,
    /// Attempts per task before the stage is failed.
    pub max_task_attempts: usize,
    /// Worker threads for map and reduce tasks (0 = one per core).
    pub threads: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            reduce_tasks: DEFAULT_REDUCE_TASKS,
            max_task_attempts: DEFAULT_MAX_TASK_ATTEMPTS,
            threads: 0,
        }
    }
}

/// Internal struct for TOML serialization of settings.
#[derive(Serialize)]
struct SerializableSettings {
    /// Pipeline settings.
    pipeline: PipelineSettings,
    /// Engine settings.
    engine: EngineSettings,
}

/// Per-invocation values that take precedence over configuration files.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    /// Overrides `pipeline.top_n`.
    pub top_n: Option<usize>,
    /// Overrides `engine.reduce_tasks`.
    pub reduce_tasks: Option<usize>,
    /// Overrides `engine.max_task_attempts`.
    pub max_task_attempts: Option<usize>,
    /// Overrides `engine.threads`.
    pub threads: Option<usize>,
}

/// Fully resolved, validated configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Directory whose files are the corpus documents.
    pub input_dir: PathBuf,
    /// Directory under which all stage outputs are written.
    pub output_base: PathBuf,
    /// Number of top-frequency terms reported per document.
    pub top_n: usize,
    /// Execution engine settings.
    pub engine: EngineSettings,
}

impl RunConfig {
    /// Resolves a run configuration from merged file settings and overrides.
    ///
    /// Rejects zero values for `top_n`, `reduce_tasks` and `max_task_attempts`.
    pub fn resolve(
        config: &Config,
        input_dir: PathBuf,
        output_base: PathBuf,
        overrides: &RunOverrides,
    ) -> Result<Self, ConfigError> {
        let top_n = overrides.top_n.unwrap_or(config.pipeline.top_n);
        let engine = EngineSettings {
            reduce_tasks: overrides
                .reduce_tasks
                .unwrap_or(config.engine.reduce_tasks),
            max_task_attempts: overrides
                .max_task_attempts
                .unwrap_or(config.engine.max_task_attempts),
            threads: overrides.threads.unwrap_or(config.engine.threads),
        };

        require_positive("pipeline.top_n", top_n)?;
        require_positive("engine.reduce_tasks", engine.reduce_tasks)?;
        require_positive("engine.max_task_attempts", engine.max_task_attempts)?;

        Ok(Self {
            input_dir,
            output_base,
            top_n,
            engine,
        })
    }

    /// Validates the run configuration and returns any warnings.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_run(self)
    }
}

/// Returns an `InvalidValue` error when `value` is zero.
fn require_positive(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue { field, value });
    }
    Ok(())
}
