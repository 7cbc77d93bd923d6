//! Named output channels.
//!
//! A channel is a named, independently located output stream. Stages declare the
//! channels they consume and produce; the orchestrator derives stage dependencies
//! from those declarations and the output layout maps each channel to a location.

use std::fmt;

use serde::Serialize;

/// File-name prefix of the default (unnamed) output of a stage.
pub const DEFAULT_CHANNEL: &str = "part";

/// Every channel flowing through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// The input documents. Supplied from outside the pipeline.
    Corpus,
    /// Raw term counts `term, document, count` from stage 1.
    RawCounts,
    /// Document lengths `document, total` from stage 1.
    DocTotals,
    /// Term frequencies `term, document, tf` from stage 2.
    TermFrequency,
    /// Inverse document frequencies `term, idf` from stage 3.
    InverseDocFrequency,
    /// Fused scores `document, term, tfidf` from stage 4.
    TfIdf,
    /// Per-document ranking `document, rank, term, frequency` from stage 5.
    TopN,
}

impl Channel {
    /// File-name prefix used for this channel's output files.
    pub const fn file_prefix(self) -> &'static str {
        match self {
            Self::RawCounts => "tfraw",
            Self::DocTotals => "doctotal",
            Self::Corpus
            | Self::TermFrequency
            | Self::InverseDocFrequency
            | Self::TfIdf
            | Self::TopN => DEFAULT_CHANNEL,
        }
    }

    /// Whether the channel is provided from outside the pipeline.
    pub const fn is_external(self) -> bool {
        matches!(self, Self::Corpus)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Corpus => "corpus",
            Self::RawCounts => "raw-counts",
            Self::DocTotals => "doc-totals",
            Self::TermFrequency => "term-frequency",
            Self::InverseDocFrequency => "inverse-doc-frequency",
            Self::TfIdf => "tfidf",
            Self::TopN => "top-n",
        };
        f.write_str(name)
    }
}
