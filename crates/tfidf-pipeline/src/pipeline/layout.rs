//! Locations of every channel for one run.

use std::path::PathBuf;

use super::StageId;
use crate::{channel::Channel, engine::InputSource};

/// Maps channels and stages to paths under an output base directory.
///
/// ```text
/// <base>/step1/tfraw*        raw counts
/// <base>/step1/doctotal*     document totals
/// <base>/step2_tf/           term frequencies
/// <base>/step3_idf/          inverse document frequencies
/// <base>/step4_tfidf/        TF-IDF scores
/// <base>/top<N>_freq/        per-document ranking
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// Directory holding the input documents.
    input_dir: PathBuf,
    /// Output base directory.
    base: PathBuf,
    /// Ranking size, part of the stage-5 directory name.
    top_n: usize,
}

impl OutputLayout {
    /// Creates a layout.
    pub fn new(input_dir: PathBuf, base: PathBuf, top_n: usize) -> Self {
        Self {
            input_dir,
            base,
            top_n,
        }
    }

    /// Ranking size.
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Stage 1 output directory.
    pub fn step1(&self) -> PathBuf {
        self.base.join("step1")
    }

    /// Stage 2 output directory.
    pub fn step2_tf(&self) -> PathBuf {
        self.base.join("step2_tf")
    }

    /// Stage 3 output directory.
    pub fn step3_idf(&self) -> PathBuf {
        self.base.join("step3_idf")
    }

    /// Stage 4 output directory.
    pub fn step4_tfidf(&self) -> PathBuf {
        self.base.join("step4_tfidf")
    }

    /// Stage 5 output directory.
    pub fn top_n_freq(&self) -> PathBuf {
        self.base.join(format!("top{}_freq", self.top_n))
    }

    /// Output directory of a stage.
    pub fn stage_output(&self, stage: StageId) -> PathBuf {
        match stage {
            StageId::TermCount => self.step1(),
            StageId::TermFrequency => self.step2_tf(),
            StageId::InverseDocumentFrequency => self.step3_idf(),
            StageId::TfIdf => self.step4_tfidf(),
            StageId::TopN => self.top_n_freq(),
        }
    }

    /// Output directories of every stage, in stage order.
    pub fn all_stage_outputs(&self) -> Vec<(StageId, PathBuf)> {
        StageId::ALL
            .into_iter()
            .map(|stage| (stage, self.stage_output(stage)))
            .collect()
    }

    /// Where a channel is read from.
    ///
    /// Stage 1's channels share a directory and are selected by file prefix; every
    /// other channel owns its directory.
    pub fn source(&self, channel: Channel) -> InputSource {
        match channel {
            Channel::Corpus => InputSource::Directory(self.input_dir.clone()),
            Channel::RawCounts | Channel::DocTotals => {
                InputSource::Glob(self.step1().join(format!("{}*", channel.file_prefix())))
            }
            Channel::TermFrequency => InputSource::Directory(self.step2_tf()),
            Channel::InverseDocFrequency => InputSource::Directory(self.step3_idf()),
            Channel::TfIdf => InputSource::Directory(self.step4_tfidf()),
            Channel::TopN => InputSource::Directory(self.top_n_freq()),
        }
    }
}
