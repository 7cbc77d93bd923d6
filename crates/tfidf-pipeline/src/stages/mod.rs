//! The five pipeline stages.
//!
//! Each stage module declares its [`StageNode`] (the channels it reads and writes) and
//! a `run` function that loads its side inputs and hands its mapper and reducer to the
//! engine.

pub mod idf;
pub mod term_count;
pub mod tf;
pub mod tfidf;
pub mod top_freq;

use crate::{
    PipelineError,
    engine::{Job, LocalEngine, StageReport},
    pipeline::{OutputLayout, StageId, StageNode},
};

/// Nodes of every stage, in declaration order.
pub const NODES: [StageNode; 5] = [
    term_count::NODE,
    tf::NODE,
    idf::NODE,
    tfidf::NODE,
    top_freq::NODE,
];

/// Runs one stage to completion.
pub fn run(
    stage: StageId,
    engine: &LocalEngine<'_>,
    layout: &OutputLayout,
) -> Result<StageReport, PipelineError> {
    match stage {
        StageId::TermCount => term_count::run(engine, layout),
        StageId::TermFrequency => tf::run(engine, layout),
        StageId::InverseDocumentFrequency => idf::run(engine, layout),
        StageId::TfIdf => tfidf::run(engine, layout),
        StageId::TopN => top_freq::run(engine, layout),
    }
}

/// Builds the engine job for `node`: its primary inputs and its output location.
fn job(node: &StageNode, layout: &OutputLayout) -> Job {
    Job {
        name: node.id.name().to_string(),
        inputs: node.inputs.iter().map(|c| layout.source(*c)).collect(),
        output: layout.stage_output(node.id),
    }
}
