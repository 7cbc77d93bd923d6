//! Five-stage map/reduce pipeline computing TF-IDF scores and per-document top-N term
//! rankings over a directory of text documents.
//!
//! The stages are:
//! 1. term counting: raw counts `f(t,d)` and document lengths `L(d)` on two channels
//! 2. term frequency: `TF(t,d) = f(t,d) / L(d)`
//! 3. inverse document frequency: `IDF(t) = ln(D / sum_d TF(t,d))`
//! 4. fusion: `TF(t,d) * IDF(t)`
//! 5. top-N selection by raw frequency
//!
//! Stages run on an in-process [`LocalEngine`] that follows the map/shuffle/reduce
//! contract of a distributed batch engine: concurrent map tasks, every key delivered
//! to exactly one reducer, bounded task retries and atomic output commits.
//!
//! # Example
//!
//! ```no_run
//! use tfidf_config::{Config, RunConfig, RunOverrides};
//! use tfidf_pipeline::{LocalFs, Pipeline};
//!
//! let config = RunConfig::resolve(
//!     &Config::default(),
//!     "corpus".into(),
//!     "out".into(),
//!     &RunOverrides::default(),
//! )
//! .unwrap();
//! let report = Pipeline::new(&LocalFs, config).run().unwrap();
//! for stage in &report.stages {
//!     println!("{}: {} records", stage.name, stage.counters.total_output_records());
//! }
//! ```

#![warn(missing_docs)]

mod channel;
mod engine;
mod error;
mod fs;
mod pipeline;
mod record;
mod side_input;
mod stages;
mod stopwords;
mod tokenizer;
mod top_n;

pub use channel::{Channel, DEFAULT_CHANNEL};
pub use engine::{
    Emitter, InputSource, InputSplit, Job, LocalEngine, MapContext, MapOnly, Mapper, Reducer,
    SUCCESS_MARKER, StageReport, StageState, TaskCounters,
};
pub use error::PipelineError;
pub use fs::{FileSystem, LocalFs};
pub use pipeline::{OutputLayout, Pipeline, RunReport, StageGraph, StageId, StageNode};
pub use record::{
    DocTotal, InverseDocFrequency, Record, TermCount, TermFrequency, TfIdf, TopNEntry,
};
pub use side_input::{CorpusSize, IdfTable};
pub use stages::{
    idf::{IdfReducer, TfByTerm},
    term_count::{TermCountKey, TermCounter},
    tf::{TfComputer, TfInput},
    tfidf::TfIdfFuser,
    top_freq::{CountsByDocument, TopFreqReducer},
};
pub use stopwords::{is_stop_word, stop_words};
pub use tokenizer::{Tokens, tokenize};
pub use top_n::{BoundedTopN, RankedTerm};
