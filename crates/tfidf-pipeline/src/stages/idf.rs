//! Stage 3: inverse document frequency.
//!
//! `IDF(t) = ln(D / S)` where `S` is the sum of `TF(t,d)` over all documents and `D`
//! is the corpus size. `D` is a side input counted from stage 1's document totals
//! before any record is mapped.

use tracing::info;

use crate::{
    PipelineError,
    channel::Channel,
    engine::{Emitter, InputSplit, LocalEngine, MapContext, Mapper, Reducer, StageReport},
    pipeline::{OutputLayout, StageId, StageNode},
    record::{InverseDocFrequency, Record, TermFrequency},
    side_input::CorpusSize,
};

/// Graph node for this stage.
pub const NODE: StageNode = StageNode {
    id: StageId::InverseDocumentFrequency,
    inputs: &[Channel::TermFrequency],
    side_inputs: &[Channel::DocTotals],
    produces: &[Channel::InverseDocFrequency],
};

/// Emits `(term, tf)` for every term frequency record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfByTerm;

impl Mapper for TfByTerm {
    type Key = String;
    type Value = f64;

    fn map(&self, _split: &InputSplit, line: &str, ctx: &mut MapContext<String, f64>) {
        if line.trim().is_empty() {
            return;
        }
        match TermFrequency::parse_line(line) {
            Some(record) => ctx.emit(record.term, record.tf),
            None => ctx.skip_malformed(),
        }
    }
}

/// Sums term frequencies per term and converts the sum to an IDF.
#[derive(Debug, Clone, Copy)]
pub struct IdfReducer {
    /// Corpus size `D`.
    pub corpus_size: CorpusSize,
}

impl Reducer for IdfReducer {
    type Key = String;
    type Value = f64;

    fn reduce(&self, term: &String, values: &[f64], out: &mut Emitter) {
        let CorpusSize(documents) = self.corpus_size;
        let sum: f64 = values.iter().sum();
        if sum <= 0.0 || documents == 0 {
            return;
        }
        out.emit(&InverseDocFrequency {
            term: term.clone(),
            idf: (documents as f64 / sum).ln(),
        });
    }
}

/// Runs stage 3.
pub fn run(engine: &LocalEngine<'_>, layout: &OutputLayout) -> Result<StageReport, PipelineError> {
    let corpus_size = CorpusSize::load(engine.fs(), &layout.step1())?;
    info!(documents = corpus_size.0, "corpus size loaded");
    engine.run_map_reduce(
        &super::job(&NODE, layout),
        &TfByTerm,
        &IdfReducer { corpus_size },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce(documents: u64, values: &[f64]) -> String {
        let reducer = IdfReducer {
            corpus_size: CorpusSize(documents),
        };
        let mut out = Emitter::new(&[]);
        reducer.reduce(&"sat".to_string(), values, &mut out);
        let (mut channels, _) = out.into_parts();
        channels.remove("part").unwrap_or_default()
    }

    #[test]
    fn divides_corpus_size_by_tf_sum() {
        let line = reduce(2, &[1.0 / 3.0, 1.0 / 3.0]);
        let record = InverseDocFrequency::parse_line(&line).unwrap();
        assert_eq!(record.term, "sat");
        assert!((record.idf - 3.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn degenerate_sums_emit_nothing() {
        assert_eq!(reduce(2, &[0.0]), "");
        assert_eq!(reduce(0, &[0.5]), "");
    }

    #[test]
    fn map_skips_malformed_lines() {
        let split = InputSplit::new(0, "step2_tf/part-r-00000".into());
        let mut ctx = MapContext::new();
        TfByTerm.map(&split, "cat\tdoc1\t0.25", &mut ctx);
        TfByTerm.map(&split, "cat\tdoc1", &mut ctx);

        let (records, counters) = ctx.into_parts();

        assert_eq!(records, vec![("cat".to_string(), 0.25)]);
        assert_eq!(counters.malformed_records, 1);
    }
}
