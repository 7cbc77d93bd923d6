//! Orchestration: runs the stages in dependency order behind barriers.

mod graph;
mod layout;

use std::{fmt, path::PathBuf, time::Instant};

pub use graph::{StageGraph, StageNode};
pub use layout::OutputLayout;
use serde::Serialize;
use tfidf_config::RunConfig;
use tracing::info;

use crate::{
    PipelineError,
    engine::{LocalEngine, StageReport},
    fs::FileSystem,
    stages,
};

/// Identifies a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// Stage 1: raw term counts and document totals.
    TermCount,
    /// Stage 2: term frequency.
    TermFrequency,
    /// Stage 3: inverse document frequency.
    InverseDocumentFrequency,
    /// Stage 4: TF-IDF fusion.
    TfIdf,
    /// Stage 5: top-N by raw frequency.
    TopN,
}

impl StageId {
    /// Every stage, in pipeline order.
    pub const ALL: [Self; 5] = [
        Self::TermCount,
        Self::TermFrequency,
        Self::InverseDocumentFrequency,
        Self::TfIdf,
        Self::TopN,
    ];

    /// Short name used in logs and reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::TermCount => "term-count",
            Self::TermFrequency => "term-frequency",
            Self::InverseDocumentFrequency => "inverse-document-frequency",
            Self::TfIdf => "tfidf",
            Self::TopN => "top-n",
        }
    }

    /// 1-based position in the pipeline.
    pub fn number(self) -> u8 {
        match self {
            Self::TermCount => 1,
            Self::TermFrequency => 2,
            Self::InverseDocumentFrequency => 3,
            Self::TfIdf => 4,
            Self::TopN => 5,
        }
    }

    /// Process exit code reported when this stage fails. Distinct per stage and
    /// never 0 or 1.
    pub fn exit_code(self) -> u8 {
        self.number() + 1
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.name())
    }
}

/// Outcome of a complete pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Input directory.
    pub input_dir: PathBuf,
    /// Output base directory.
    pub output_base: PathBuf,
    /// Ranking size.
    pub top_n: usize,
    /// Reports of every stage, in execution order.
    pub stages: Vec<StageReport>,
    /// Wall-clock duration of the whole run in milliseconds.
    pub elapsed_ms: u64,
}

/// A configured pipeline over a filesystem.
pub struct Pipeline<'fs> {
    /// Filesystem for every read, write and delete.
    fs: &'fs dyn FileSystem,
    /// Resolved run configuration.
    config: RunConfig,
    /// Stage graph.
    graph: StageGraph,
    /// Channel locations.
    layout: OutputLayout,
}

impl<'fs> Pipeline<'fs> {
    /// Creates the standard five-stage pipeline.
    pub fn new(fs: &'fs dyn FileSystem, config: RunConfig) -> Self {
        let layout = OutputLayout::new(
            config.input_dir.clone(),
            config.output_base.clone(),
            config.top_n,
        );
        Self {
            fs,
            config,
            graph: StageGraph::standard(),
            layout,
        }
    }

    /// Deletes any existing output of every stage.
    pub fn cleanup(&self) -> Result<(), PipelineError> {
        for (stage, path) in self.layout.all_stage_outputs() {
            if self.fs.delete(&path)? {
                info!(%stage, path = %path.display(), "removed previous output");
            }
        }
        Ok(())
    }

    /// Runs every stage to completion.
    ///
    /// Previous outputs are deleted first. Stages run one at a time in dependency
    /// order; a failing stage stops the run and nothing downstream of it is started.
    pub fn run(&self) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        let order = self.graph.execution_order()?;
        self.cleanup()?;
        let engine = LocalEngine::new(self.fs, &self.config.engine)?;

        let mut reports = Vec::with_capacity(order.len());
        for stage in order {
            info!(%stage, "running stage");
            let report = stages::run(stage, &engine, &self.layout).map_err(|source| {
                PipelineError::StageFailed {
                    stage,
                    source: Box::new(source),
                }
            })?;
            reports.push(report);
        }

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(stages = reports.len(), elapsed_ms, "pipeline complete");
        Ok(RunReport {
            input_dir: self.config.input_dir.clone(),
            output_base: self.config.output_base.clone(),
            top_n: self.config.top_n,
            stages: reports,
            elapsed_ms,
        })
    }
}
