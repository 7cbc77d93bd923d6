//! Per-invocation state shared by the CLI commands.

use std::{env, path::PathBuf, process::ExitCode};

use tfidf_config::{Config, RunConfig, RunOverrides};

/// Working directory and configuration, loaded once before a command runs.
pub struct CommandContext {
    /// Directory the command was started from. Config discovery begins here.
    pub cwd: PathBuf,
    /// Merged configuration, or the defaults when no `.tfidf.toml` exists.
    pub config: Config,
}

impl CommandContext {
    /// Resolves the working directory and loads every config layer above it.
    pub fn load() -> Result<Self, ExitCode> {
        let cwd = working_dir()?;
        let config = Config::load(&cwd).map_err(|e| {
            eprintln!("error: failed to load configuration: {e}");
            ExitCode::FAILURE
        })?;
        Ok(Self { cwd, config })
    }

    /// Resolves the working directory with default settings.
    ///
    /// `init` uses this so that it can replace a config file that no longer parses.
    pub fn load_cwd_only() -> Result<Self, ExitCode> {
        Ok(Self {
            cwd: working_dir()?,
            config: Config::default(),
        })
    }

    /// Builds the settings for one pipeline run from the loaded configuration and
    /// command-line overrides. Invalid values are reported and exit with 1.
    pub fn run_config(
        &self,
        input_dir: PathBuf,
        output_base: PathBuf,
        overrides: &RunOverrides,
    ) -> Result<RunConfig, ExitCode> {
        RunConfig::resolve(&self.config, input_dir, output_base, overrides).map_err(|e| {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        })
    }
}

/// The process working directory.
fn working_dir() -> Result<PathBuf, ExitCode> {
    env::current_dir().map_err(|e| {
        eprintln!("error: could not determine current directory: {e}");
        ExitCode::FAILURE
    })
}
