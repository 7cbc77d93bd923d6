//! Stage 1: raw term counts and document lengths.
//!
//! Every term of a document produces one occurrence event for `(document, term)` and
//! one for `document`. The reducer sums them into two separate channels: `tfraw`
//! holds `term, document, count` and `doctotal` holds `document, total`.
//!
//! Each document additionally contributes a zero-valued document event once its last
//! line is mapped, so a document with no terms still gets a `doctotal` record (with a
//! total of 0) and counts toward the corpus size.

use crate::{
    PipelineError,
    channel::Channel,
    engine::{Emitter, InputSplit, LocalEngine, MapContext, Mapper, Reducer, StageReport},
    pipeline::{OutputLayout, StageId, StageNode},
    record::{DocTotal, TermCount},
    tokenizer::tokenize,
};

/// Graph node for this stage.
pub const NODE: StageNode = StageNode {
    id: StageId::TermCount,
    inputs: &[Channel::Corpus],
    side_inputs: &[],
    produces: &[Channel::RawCounts, Channel::DocTotals],
};

/// File prefixes of the two output channels.
const CHANNELS: [&str; 2] = [
    Channel::RawCounts.file_prefix(),
    Channel::DocTotals.file_prefix(),
];

/// Shuffle key: either a term within a document, or the document itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TermCountKey {
    /// Occurrences of one term in one document.
    Term {
        /// The document id.
        document: String,
        /// The term.
        term: String,
    },
    /// All term occurrences of one document.
    Document {
        /// The document id.
        document: String,
    },
}

/// Mapper and reducer for stage 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct TermCounter;

impl Mapper for TermCounter {
    type Key = TermCountKey;
    type Value = u64;

    fn map(&self, split: &InputSplit, line: &str, ctx: &mut MapContext<TermCountKey, u64>) {
        let document = split.document_id();
        for term in tokenize(line) {
            ctx.emit(
                TermCountKey::Term {
                    document: document.to_string(),
                    term,
                },
                1,
            );
            ctx.emit(
                TermCountKey::Document {
                    document: document.to_string(),
                },
                1,
            );
        }
    }

    fn finish(&self, split: &InputSplit, ctx: &mut MapContext<TermCountKey, u64>) {
        ctx.emit(
            TermCountKey::Document {
                document: split.document_id().to_string(),
            },
            0,
        );
    }
}

impl Reducer for TermCounter {
    type Key = TermCountKey;
    type Value = u64;

    fn channels(&self) -> &[&'static str] {
        &CHANNELS
    }

    fn reduce(&self, key: &TermCountKey, values: &[u64], out: &mut Emitter) {
        let sum = values.iter().sum();
        match key {
            TermCountKey::Term { document, term } => out.emit_to(
                Channel::RawCounts.file_prefix(),
                &TermCount {
                    term: term.clone(),
                    document: document.clone(),
                    count: sum,
                },
            ),
            TermCountKey::Document { document } => out.emit_to(
                Channel::DocTotals.file_prefix(),
                &DocTotal {
                    document: document.clone(),
                    total: sum,
                },
            ),
        }
    }
}

/// Runs stage 1.
pub fn run(engine: &LocalEngine<'_>, layout: &OutputLayout) -> Result<StageReport, PipelineError> {
    engine.run_map_reduce(&super::job(&NODE, layout), &TermCounter, &TermCounter)
}
