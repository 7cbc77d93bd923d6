//! tfidf: TF-IDF over a directory of documents.
//!
//! Runs a five-stage map/reduce pipeline that writes raw term counts, term
//! frequencies, inverse document frequencies, TF-IDF scores and a per-document
//! ranking of the most frequent terms under an output base directory. Every stage
//! commits its output atomically, and a rerun first removes the previous outputs.

#![warn(missing_docs)]

pub mod cli;
