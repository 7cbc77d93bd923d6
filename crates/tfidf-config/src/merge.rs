//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single resolved `Config`,
//! applying precedence rules.

use std::path::{Path, PathBuf};

use crate::{
    Config, EngineSettings, PipelineSettings,
    parse::{RawConfig, RawEngineSettings, RawPipelineSettings},
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges multiple configuration files into a single resolved `Config`.
///
/// Configs should be provided in precedence order: highest precedence first (closest to CWD),
/// lowest precedence last (global config). For every scalar setting the first defined value
/// wins.
pub fn merge_configs(configs: &[ParsedConfig]) -> Config {
    if configs.is_empty() {
        return Config::default();
    }

    let mut pipeline = PipelineSettings::default();
    let mut engine = EngineSettings::default();

    // Lowest precedence first so higher precedence overwrites
    for parsed in configs.iter().rev() {
        if let Some(ref raw) = parsed.config.pipeline {
            apply_raw_pipeline(&mut pipeline, raw);
        }
        if let Some(ref raw) = parsed.config.engine {
            apply_raw_engine(&mut engine, raw);
        }
    }

    let config_root = configs
        .first()
        .and_then(|c| c.path.parent())
        .map(Path::to_path_buf);

    Config {
        pipeline,
        engine,
        config_root,
    }
}

/// Applies raw pipeline settings to result, overwriting any present values.
fn apply_raw_pipeline(result: &mut PipelineSettings, raw: &RawPipelineSettings) {
    if let Some(v) = raw.top_n {
        result.top_n = v;
    }
}

/// Applies raw engine settings to result, overwriting any present values.
fn apply_raw_engine(result: &mut EngineSettings, raw: &RawEngineSettings) {
    if let Some(v) = raw.reduce_tasks {
        result.reduce_tasks = v;
    }
    if let Some(v) = raw.max_task_attempts {
        result.max_task_attempts = v;
    }
    if let Some(v) = raw.threads {
        result.threads = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(path: &str, toml: &str) -> ParsedConfig {
        ParsedConfig {
            path: PathBuf::from(path),
            config: toml::from_str(toml).unwrap(),
        }
    }

    #[test]
    fn test_merge_empty() {
        let config = merge_configs(&[]);
        assert_eq!(config.pipeline.top_n, 5);
        assert!(config.config_root.is_none());
    }

    #[test]
    fn test_merge_closest_wins_per_field() {
        let configs = [
            parsed("/work/project/.tfidf.toml", "[engine]\nthreads = 2\n"),
            parsed(
                "/home/user/.tfidf.toml",
                "[pipeline]\ntop_n = 9\n[engine]\nthreads = 16\nreduce_tasks = 3\n",
            ),
        ];

        let config = merge_configs(&configs);

        assert_eq!(config.engine.threads, 2);
        assert_eq!(config.engine.reduce_tasks, 3);
        assert_eq!(config.pipeline.top_n, 9);
        assert_eq!(config.engine.max_task_attempts, 4);
        assert_eq!(config.config_root, Some(PathBuf::from("/work/project")));
    }
}
