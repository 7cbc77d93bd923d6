//! Side inputs: data a stage loads in full before it processes any record.
//!
//! Both loaders read from committed stage outputs and return immutable values that are
//! shared read-only by every task of the consuming stage.

use std::{collections::HashMap, path::Path};

use tracing::{debug, warn};

use crate::{
    PipelineError,
    channel::{Channel, DEFAULT_CHANNEL},
    fs::FileSystem,
    record::{InverseDocFrequency, Record},
};

/// Number of documents in the corpus, `D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusSize(pub u64);

impl CorpusSize {
    /// Counts the document-total records under `step1_dir`.
    ///
    /// Every non-blank line of a `doctotal*` file is one document. A missing directory
    /// is a fatal error: the count would be silently wrong otherwise.
    pub fn load(fs: &dyn FileSystem, step1_dir: &Path) -> Result<Self, PipelineError> {
        if !fs.is_dir(step1_dir) {
            return Err(PipelineError::MissingSideInput {
                what: "document totals",
                path: step1_dir.to_path_buf(),
            });
        }

        let pattern = step1_dir.join(format!("{}*", Channel::DocTotals.file_prefix()));
        let mut documents = 0;
        for file in fs.glob(&pattern)? {
            let contents = fs.read_to_string(&file)?;
            documents += contents.lines().filter(|l| !l.trim().is_empty()).count() as u64;
        }

        debug!(documents, dir = %step1_dir.display(), "loaded corpus size");
        Ok(Self(documents))
    }
}

/// The complete term to IDF mapping produced by stage 3.
#[derive(Debug, Clone, Default)]
pub struct IdfTable {
    /// IDF per term.
    values: HashMap<String, f64>,
}

impl IdfTable {
    /// Loads every IDF record under `step3_dir`.
    ///
    /// A missing directory yields an empty table, so every lookup misses and the
    /// consuming stage drops its records instead of failing. Malformed lines are skipped.
    pub fn load(fs: &dyn FileSystem, step3_dir: &Path) -> Result<Self, PipelineError> {
        if !fs.is_dir(step3_dir) {
            warn!(dir = %step3_dir.display(), "IDF table not found; every term will be dropped");
            return Ok(Self::default());
        }

        let mut values = HashMap::new();
        let mut malformed = 0_u64;
        for file in fs.glob(&step3_dir.join(format!("{DEFAULT_CHANNEL}*")))? {
            for line in fs.read_to_string(&file)?.lines() {
                match InverseDocFrequency::parse_line(line) {
                    Some(record) => {
                        values.insert(record.term, record.idf);
                    }
                    None if line.trim().is_empty() => {}
                    None => malformed += 1,
                }
            }
        }

        if malformed > 0 {
            warn!(malformed, dir = %step3_dir.display(), "skipped malformed IDF lines");
        }
        debug!(terms = values.len(), dir = %step3_dir.display(), "loaded IDF table");
        Ok(Self { values })
    }

    /// The IDF of `term`, if present.
    pub fn get(&self, term: &str) -> Option<f64> {
        self.values.get(term).copied()
    }

    /// Number of terms in the table.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
