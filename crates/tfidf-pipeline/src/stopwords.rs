//! Fixed English stop-word list.
//!
//! Stop words are removed before any counting, so they never appear in term
//! counts, document lengths or any downstream output.

/// Stop words, sorted for binary search. All entries are lowercase ASCII.
static STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "be", "been", "being", "but", "by", "else", "for", "from", "if",
    "in", "is", "it", "its", "of", "on", "or", "the", "then", "to", "was", "were", "when", "with",
];

/// Checks whether a normalized (lowercase) token is a stop word.
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Returns the full stop-word list.
pub fn stop_words() -> &'static [&'static str] {
    STOP_WORDS
}
