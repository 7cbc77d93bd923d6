//! Error types for the tfidf-pipeline crate.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::{channel::Channel, pipeline::StageId};

/// Errors that can occur while running pipeline stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A primary input location does not exist.
    #[error("input path does not exist: {path}")]
    InputNotFound {
        /// The missing input.
        path: PathBuf,
    },

    /// A stage output location already exists.
    #[error("output directory already exists: {path}")]
    OutputExists {
        /// The existing output location.
        path: PathBuf,
    },

    /// A side input required before processing could not be located.
    #[error("missing side input ({what}): {path}")]
    MissingSideInput {
        /// Which side input was being loaded.
        what: &'static str,
        /// The location that was expected to hold it.
        path: PathBuf,
    },

    /// A glob pattern failed to compile.
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        /// The invalid pattern.
        pattern: String,
        /// Underlying glob error.
        source: globset::Error,
    },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A task kept failing until its retry budget ran out.
    #[error("task {task} failed after {attempts} attempt(s): {source}")]
    TaskFailed {
        /// Task name, e.g. `term-frequency/m-00003`.
        task: String,
        /// Number of attempts made.
        attempts: usize,
        /// Error from the final attempt.
        source: Box<PipelineError>,
    },

    /// A stage failed; nothing downstream of it was run.
    #[error("stage {stage} failed: {source}")]
    StageFailed {
        /// The failed stage.
        stage: StageId,
        /// Cause of the failure.
        source: Box<PipelineError>,
    },

    /// A stage consumes a channel that no stage produces.
    #[error("stage {stage} consumes channel {channel} which no stage produces")]
    UnknownChannel {
        /// The consuming stage.
        stage: StageId,
        /// The unproduced channel.
        channel: Channel,
    },

    /// The stage dependency graph contains a cycle.
    #[error("stage graph contains a dependency cycle")]
    StageCycle,
}

impl PipelineError {
    /// Creates an `Io` error for the given path.
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether rerunning the failing task could succeed.
    ///
    /// Configuration problems are deterministic and fail the stage immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Process exit code for this error.
    ///
    /// Stage failures map to the stage's own code so callers can tell which stage
    /// failed; every other error is a general failure (1).
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::StageFailed { stage, .. } => stage.exit_code(),
            _ => 1,
        }
    }
}
