//! Line tokenizer.
//!
//! Normalization lowercases the line, splits it on every run of characters that are
//! not ASCII letters or digits, drops empty tokens and drops stop words. Tokenization
//! is pure and works on one line at a time.

use std::str::Split;

use crate::stopwords::is_stop_word;

/// Lazy iterator over the normalized terms of one line.
///
/// Cloning forks the traversal at the current position; calling [`tokenize`]
/// again restarts it.
#[derive(Clone)]
pub struct Tokens<'a> {
    /// Raw pieces of the line between separators.
    pieces: Split<'a, fn(char) -> bool>,
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        for piece in self.pieces.by_ref() {
            if piece.is_empty() {
                continue;
            }
            let term = piece.to_ascii_lowercase();
            if is_stop_word(&term) {
                continue;
            }
            return Some(term);
        }
        None
    }
}

/// Returns true for characters that separate terms.
fn is_separator(c: char) -> bool {
    !c.is_ascii_alphanumeric()
}

/// Tokenizes one line of raw text into normalized terms.
pub fn tokenize(line: &str) -> Tokens<'_> {
    Tokens {
        pieces: line.split(is_separator as fn(char) -> bool),
    }
}
