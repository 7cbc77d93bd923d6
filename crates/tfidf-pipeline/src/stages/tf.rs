//! Stage 2: term frequency.
//!
//! Joins both stage-1 channels per document and divides each raw count by the
//! document's length. Documents with a length of zero produce nothing.

use crate::{
    PipelineError,
    channel::Channel,
    engine::{Emitter, InputSplit, LocalEngine, MapContext, Mapper, Reducer, StageReport},
    pipeline::{OutputLayout, StageId, StageNode},
    record::{DocTotal, Record, TermCount, TermFrequency},
};

/// Graph node for this stage.
pub const NODE: StageNode = StageNode {
    id: StageId::TermFrequency,
    inputs: &[Channel::RawCounts, Channel::DocTotals],
    side_inputs: &[],
    produces: &[Channel::TermFrequency],
};

/// A stage-1 record re-keyed by document, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TfInput {
    /// The document's length `L(d)`.
    DocTotal(u64),
    /// One term's raw count `f(t,d)`.
    TermCount {
        /// The term.
        term: String,
        /// Occurrences in the document.
        count: u64,
    },
}

/// Mapper and reducer for stage 2.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfComputer;

impl Mapper for TfComputer {
    type Key = String;
    type Value = TfInput;

    fn map(&self, _split: &InputSplit, line: &str, ctx: &mut MapContext<String, TfInput>) {
        if line.trim().is_empty() {
            return;
        }
        // The two channels differ in field count, so the line shape identifies the kind
        if let Some(record) = TermCount::parse_line(line) {
            ctx.emit(
                record.document,
                TfInput::TermCount {
                    term: record.term,
                    count: record.count,
                },
            );
        } else if let Some(record) = DocTotal::parse_line(line) {
            ctx.emit(record.document, TfInput::DocTotal(record.total));
        } else {
            ctx.skip_malformed();
        }
    }
}

impl Reducer for TfComputer {
    type Key = String;
    type Value = TfInput;

    fn reduce(&self, document: &String, values: &[TfInput], out: &mut Emitter) {
        let total: u64 = values
            .iter()
            .filter_map(|v| match v {
                TfInput::DocTotal(total) => Some(*total),
                TfInput::TermCount { .. } => None,
            })
            .sum();
        if total == 0 {
            return;
        }

        for value in values {
            if let TfInput::TermCount { term, count } = value {
                out.emit(&TermFrequency {
                    term: term.clone(),
                    document: document.clone(),
                    tf: *count as f64 / total as f64,
                });
            }
        }
    }
}

/// Runs stage 2.
pub fn run(engine: &LocalEngine<'_>, layout: &OutputLayout) -> Result<StageReport, PipelineError> {
    engine.run_map_reduce(&super::job(&NODE, layout), &TfComputer, &TfComputer)
}
