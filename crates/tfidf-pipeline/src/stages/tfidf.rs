//! Stage 4: TF-IDF fusion.
//!
//! A map-only join of every term frequency record against the complete IDF table,
//! which is loaded before the first record is read. Terms missing from the table are
//! dropped.

use tracing::info;

use crate::{
    PipelineError,
    channel::Channel,
    engine::{Emitter, InputSplit, LocalEngine, MapOnly, StageReport},
    pipeline::{OutputLayout, StageId, StageNode},
    record::{Record, TermFrequency, TfIdf},
    side_input::IdfTable,
};

/// Graph node for this stage.
pub const NODE: StageNode = StageNode {
    id: StageId::TfIdf,
    inputs: &[Channel::TermFrequency],
    side_inputs: &[Channel::InverseDocFrequency],
    produces: &[Channel::TfIdf],
};

/// Multiplies each term frequency by its term's IDF.
#[derive(Debug, Clone)]
pub struct TfIdfFuser {
    /// The loaded IDF table.
    idf: IdfTable,
}

impl TfIdfFuser {
    /// Creates a fuser over a loaded table.
    pub fn new(idf: IdfTable) -> Self {
        Self { idf }
    }
}

impl MapOnly for TfIdfFuser {
    fn map(&self, _split: &InputSplit, line: &str, out: &mut Emitter) {
        if line.trim().is_empty() {
            return;
        }
        let Some(record) = TermFrequency::parse_line(line) else {
            out.skip_malformed();
            return;
        };
        match self.idf.get(&record.term) {
            Some(idf) => out.emit(&TfIdf {
                document: record.document,
                term: record.term,
                tfidf: record.tf * idf,
            }),
            None => out.drop_unmatched(),
        }
    }
}

/// Runs stage 4.
pub fn run(engine: &LocalEngine<'_>, layout: &OutputLayout) -> Result<StageReport, PipelineError> {
    let idf = IdfTable::load(engine.fs(), &layout.step3_idf())?;
    info!(terms = idf.len(), "IDF table loaded");
    engine.run_map_only(&super::job(&NODE, layout), &TfIdfFuser::new(idf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileSystem, LocalFs};

    #[test]
    fn joins_and_drops_unknown_terms() {
        let dir = tempfile::tempdir().unwrap();
        LocalFs
            .write(&dir.path().join("part-r-00000"), "cat\t2\n")
            .unwrap();
        let fuser = TfIdfFuser::new(IdfTable::load(&LocalFs, dir.path()).unwrap());
        let split = InputSplit::new(0, "step2_tf/part-r-00000".into());
        let mut out = Emitter::new(&[]);

        fuser.map(&split, "cat\tdoc1\t0.25", &mut out);
        fuser.map(&split, "dog\tdoc1\t0.75", &mut out);
        fuser.map(&split, "not a record", &mut out);

        let (channels, counters) = out.into_parts();
        assert_eq!(channels["part"], "doc1\tcat\t0.5\n");
        assert_eq!(counters.dropped_records, 1);
        assert_eq!(counters.malformed_records, 1);
    }

    #[test]
    fn empty_table_drops_everything() {
        let fuser = TfIdfFuser::new(IdfTable::default());
        let split = InputSplit::new(0, "step2_tf/part-r-00000".into());
        let mut out = Emitter::new(&[]);

        fuser.map(&split, "cat\tdoc1\t0.25", &mut out);

        let (channels, counters) = out.into_parts();
        assert!(channels.is_empty());
        assert_eq!(counters.dropped_records, 1);
    }
}
