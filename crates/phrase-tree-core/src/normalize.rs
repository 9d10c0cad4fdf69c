//! Phrase text normalization.
//!
//! Every lookup key, every stored phrase and every display string passes
//! through [`normalize_phrase`], so two spellings that differ only in case or
//! spacing address the same phrase.

use std::fmt::Display;

/// Lower-case, collapse whitespace runs to a single space, trim both ends.
pub fn normalize_phrase(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize any displayable value, coercing it to a string first.
///
/// Numeric cells in a phrase column (`"404"`, `3.5`) are phrases too.
pub fn normalize_value<T: Display + ?Sized>(value: &T) -> String {
    normalize_phrase(&value.to_string())
}

/// Split normalized text into words.
pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}
