//! Stage 5: per-document top-N terms by raw frequency.

use crate::{
    PipelineError,
    channel::Channel,
    engine::{Emitter, InputSplit, LocalEngine, MapContext, Mapper, Reducer, StageReport},
    pipeline::{OutputLayout, StageId, StageNode},
    record::{Record, TermCount, TopNEntry},
    top_n::{BoundedTopN, RankedTerm},
};

/// Graph node for this stage.
pub const NODE: StageNode = StageNode {
    id: StageId::TopN,
    inputs: &[Channel::RawCounts],
    side_inputs: &[],
    produces: &[Channel::TopN],
};

/// Re-keys raw counts by document.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountsByDocument;

impl Mapper for CountsByDocument {
    type Key = String;
    type Value = RankedTerm;

    fn map(&self, _split: &InputSplit, line: &str, ctx: &mut MapContext<String, RankedTerm>) {
        if line.trim().is_empty() {
            return;
        }
        match TermCount::parse_line(line) {
            Some(record) => ctx.emit(
                record.document,
                RankedTerm {
                    frequency: record.count,
                    term: record.term,
                },
            ),
            None => ctx.skip_malformed(),
        }
    }
}

/// Keeps the `n` most frequent terms of each document.
#[derive(Debug, Clone, Copy)]
pub struct TopFreqReducer {
    /// Entries kept per document.
    pub n: usize,
}

impl Reducer for TopFreqReducer {
    type Key = String;
    type Value = RankedTerm;

    fn reduce(&self, document: &String, values: &[RankedTerm], out: &mut Emitter) {
        let mut top = BoundedTopN::new(self.n);
        for value in values {
            top.push(value.clone());
        }
        for (i, ranked) in top.into_sorted_vec().into_iter().enumerate() {
            out.emit(&TopNEntry {
                document: document.clone(),
                rank: i + 1,
                term: ranked.term,
                frequency: ranked.frequency,
            });
        }
    }
}

/// Runs stage 5.
pub fn run(engine: &LocalEngine<'_>, layout: &OutputLayout) -> Result<StageReport, PipelineError> {
    engine.run_map_reduce(
        &super::job(&NODE, layout),
        &CountsByDocument,
        &TopFreqReducer { n: layout.top_n() },
    )
}
