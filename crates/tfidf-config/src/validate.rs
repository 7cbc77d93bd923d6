//! Run configuration validation.
//!
//! Validates a resolved run configuration and reports warnings for potential issues.
//! Hard errors (zero-valued settings) are rejected earlier, when the `RunConfig` is built.

use std::{fmt, fs};

use crate::RunConfig;

/// A non-fatal warning about a run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// The input directory does not exist.
    InputDirMissing {
        /// Path that doesn't exist.
        path: String,
    },
    /// The input path exists but is not a directory.
    InputNotDirectory {
        /// Path that is not a directory.
        path: String,
    },
    /// The input directory contains no documents.
    InputDirEmpty {
        /// The empty directory.
        path: String,
    },
    /// The output base lives inside the input directory, so outputs of one run
    /// would become documents of the next.
    OutputInsideInput {
        /// The output base.
        output: String,
        /// The input directory.
        input: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputDirMissing { path } => {
                write!(f, "input directory does not exist: {path}")
            }
            Self::InputNotDirectory { path } => {
                write!(f, "input path is not a directory: {path}")
            }
            Self::InputDirEmpty { path } => {
                write!(f, "input directory contains no documents: {path}")
            }
            Self::OutputInsideInput { output, input } => {
                write!(f, "output base {output} is inside input directory {input}")
            }
        }
    }
}

/// Validates the run configuration and returns any warnings.
pub fn validate_run(config: &RunConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();
    let input = &config.input_dir;
    let input_display = input.display().to_string();

    if !input.exists() {
        warnings.push(ConfigWarning::InputDirMissing {
            path: input_display,
        });
        return warnings;
    }
    if !input.is_dir() {
        warnings.push(ConfigWarning::InputNotDirectory {
            path: input_display,
        });
        return warnings;
    }

    let has_documents = fs::read_dir(input).is_ok_and(|entries| {
        entries
            .filter_map(Result::ok)
            .any(|e| e.file_type().is_ok_and(|t| t.is_file()))
    });
    if !has_documents {
        warnings.push(ConfigWarning::InputDirEmpty {
            path: input_display.clone(),
        });
    }

    if config.output_base.starts_with(input) {
        warnings.push(ConfigWarning::OutputInsideInput {
            output: config.output_base.display().to_string(),
            input: input_display,
        });
    }

    warnings
}
