//! The in-memory phrase table.
//!
//! A [`Corpus`] is built once per run from sanitized input rows. Building it
//! normalizes every phrase, optionally merges duplicates, sorts the rows by
//! ascending length (stable, so ties keep ingestion order) and assigns dense
//! ids in that order. After that only the parent linker writes to it.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::normalize::normalize_phrase;

/// Dense phrase identifier: the phrase's position in length order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct PhraseId(pub usize);

impl PhraseId {
    /// Position of the phrase in its corpus.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for PhraseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// How to treat rows whose text is identical after normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DuplicatePolicy {
    /// Keep every row; the text index points at the last one and each
    /// shadowed row is reported as a collision.
    #[default]
    KeepLast,
    /// Merge identical rows into one before ids are assigned.
    Merge,
}

impl DuplicatePolicy {
    /// Returns the policy name as used in configuration files.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::KeepLast => "keep-last",
            Self::Merge => "merge",
        }
    }
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sanitized input row, before normalization and id assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPhrase {
    /// Phrase text as read.
    pub text: String,
    /// Word count.
    pub length: usize,
    /// Document frequency.
    pub frequency: u64,
    /// Precomputed interest score, if the input carried one.
    pub score: Option<f64>,
    /// Values of pass-through columns, aligned with the table's extra headers.
    pub extra: Vec<String>,
}

impl RawPhrase {
    /// Row with no score and no extra columns.
    pub fn new(text: impl Into<String>, length: usize, frequency: u64) -> Self {
        Self {
            text: text.into(),
            length,
            frequency,
            score: None,
            extra: Vec::new(),
        }
    }
}

/// A phrase in the corpus.
///
/// Text, length and frequency are fixed at construction. `parent_id` and
/// `level` are written once by the parent linker.
#[derive(Debug, Clone, PartialEq)]
pub struct Phrase {
    id: PhraseId,
    text: String,
    length: usize,
    frequency: u64,
    score: Option<f64>,
    extra: Vec<String>,
    parent_id: Option<PhraseId>,
    level: usize,
}

impl Phrase {
    /// Identifier assigned after the length sort.
    pub const fn id(&self) -> PhraseId {
        self.id
    }

    /// Normalized phrase text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Word count as supplied by the input.
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Document frequency.
    pub const fn frequency(&self) -> u64 {
        self.frequency
    }

    /// Score supplied by the input, if any.
    pub const fn score(&self) -> Option<f64> {
        self.score
    }

    /// Pass-through column values.
    pub fn extra(&self) -> &[String] {
        &self.extra
    }

    /// Parent phrase, `None` for roots.
    pub const fn parent_id(&self) -> Option<PhraseId> {
        self.parent_id
    }

    /// Depth in the parent forest.
    pub const fn level(&self) -> usize {
        self.level
    }

    /// Number of whitespace-separated words in the normalized text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub(crate) const fn set_link(&mut self, parent_id: Option<PhraseId>, level: usize) {
        self.parent_id = parent_id;
        self.level = level;
    }
}

/// The phrase table, ordered by ascending length.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    phrases: Vec<Phrase>,
    extra_columns: Vec<String>,
    merged: usize,
}

impl Corpus {
    /// Build the table from sanitized rows.
    ///
    /// Rows with empty text after normalization are dropped.
    #[tracing::instrument(skip(rows, extra_columns), fields(rows = rows.len()))]
    pub fn build(rows: Vec<RawPhrase>, extra_columns: Vec<String>, policy: DuplicatePolicy) -> Self {
        let mut normalized: Vec<RawPhrase> = rows
            .into_iter()
            .filter_map(|mut row| {
                row.text = normalize_phrase(&row.text);
                (!row.text.is_empty()).then_some(row)
            })
            .collect();

        let before = normalized.len();
        if policy == DuplicatePolicy::Merge {
            normalized = merge_duplicates(normalized);
        }
        let merged = before - normalized.len();
        if merged > 0 {
            tracing::info!(merged, "merged duplicate phrases");
        }

        // Vec::sort_by_key is stable: equal lengths keep ingestion order.
        normalized.sort_by_key(|row| row.length);

        let phrases = normalized
            .into_iter()
            .enumerate()
            .map(|(i, row)| Phrase {
                id: PhraseId(i),
                text: row.text,
                length: row.length,
                frequency: row.frequency,
                score: row.score,
                extra: row.extra,
                parent_id: None,
                level: 0,
            })
            .collect::<Vec<_>>();

        tracing::debug!(phrases = phrases.len(), "corpus built");
        Self {
            phrases,
            extra_columns,
            merged,
        }
    }

    /// All phrases in id order.
    pub fn phrases(&self) -> &[Phrase] {
        &self.phrases
    }

    pub(crate) fn phrases_mut(&mut self) -> &mut [Phrase] {
        &mut self.phrases
    }

    /// Look up a phrase by id.
    pub fn get(&self, id: PhraseId) -> Option<&Phrase> {
        self.phrases.get(id.index())
    }

    /// Headers of the pass-through columns.
    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    /// Number of rows removed by [`DuplicatePolicy::Merge`].
    pub const fn merged(&self) -> usize {
        self.merged
    }

    /// Whether any phrase carries a supplied score.
    pub fn has_scores(&self) -> bool {
        self.phrases.iter().any(|p| p.score.is_some())
    }

    /// Number of phrases.
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    /// Whether the corpus holds no phrases.
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Largest length in the corpus, 0 when empty.
    pub fn max_length(&self) -> usize {
        self.phrases.iter().map(Phrase::length).max().unwrap_or(0)
    }

    /// Largest frequency in the corpus, 0 when empty.
    pub fn max_frequency(&self) -> u64 {
        self.phrases.iter().map(Phrase::frequency).max().unwrap_or(0)
    }

    /// Walk from `id` up to its root, starting with the parent of `id`.
    pub fn ancestors(&self, id: PhraseId) -> Ancestors<'_> {
        Ancestors {
            corpus: self,
            next: self.get(id).and_then(Phrase::parent_id),
        }
    }
}

/// Iterator over a phrase's ancestors, nearest first.
#[derive(Debug)]
pub struct Ancestors<'a> {
    corpus: &'a Corpus,
    next: Option<PhraseId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Phrase;

    fn next(&mut self) -> Option<Self::Item> {
        let phrase = self.corpus.get(self.next?)?;
        self.next = phrase.parent_id;
        Some(phrase)
    }
}

/// Collapse rows with identical text into their first occurrence.
///
/// The survivor keeps the highest frequency and the lowest supplied score.
fn merge_duplicates(rows: Vec<RawPhrase>) -> Vec<RawPhrase> {
    let mut first_seen: HashMap<String, usize> = HashMap::with_capacity(rows.len());
    let mut merged: Vec<RawPhrase> = Vec::with_capacity(rows.len());

    for row in rows {
        if let Some(&pos) = first_seen.get(&row.text) {
            let kept = &mut merged[pos];
            tracing::debug!(phrase = %row.text, "merging duplicate phrase");
            kept.frequency = kept.frequency.max(row.frequency);
            kept.score = match (kept.score, row.score) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        } else {
            first_seen.insert(row.text.clone(), merged.len());
            merged.push(row);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(items: &[(&str, usize, u64)]) -> Vec<RawPhrase> {
        items
            .iter()
            .map(|&(t, l, f)| RawPhrase::new(t, l, f))
            .collect()
    }

    #[test]
    fn sorts_by_length_and_assigns_dense_ids() {
        let corpus = Corpus::build(
            rows(&[("a b c", 3, 1), ("a", 1, 5), ("b c", 2, 2)]),
            Vec::new(),
            DuplicatePolicy::KeepLast,
        );
        let texts: Vec<_> = corpus.phrases().iter().map(Phrase::text).collect();
        assert_eq!(texts, vec!["a", "b c", "a b c"]);
        for (i, p) in corpus.phrases().iter().enumerate() {
            assert_eq!(p.id(), PhraseId(i));
        }
    }

    #[test]
    fn equal_lengths_keep_ingestion_order() {
        let corpus = Corpus::build(
            rows(&[("red car", 2, 1), ("blue car", 2, 1), ("car", 1, 1)]),
            Vec::new(),
            DuplicatePolicy::KeepLast,
        );
        let texts: Vec<_> = corpus.phrases().iter().map(Phrase::text).collect();
        assert_eq!(texts, vec!["car", "red car", "blue car"]);
    }

    #[test]
    fn normalizes_text_and_drops_blank_rows() {
        let corpus = Corpus::build(
            rows(&[("  Brown   FOX ", 2, 1), ("   ", 0, 1)]),
            Vec::new(),
            DuplicatePolicy::KeepLast,
        );
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.phrases()[0].text(), "brown fox");
    }

    #[test]
    fn keep_last_retains_duplicates() {
        let corpus = Corpus::build(
            rows(&[("Fox", 1, 1), ("fox", 1, 9)]),
            Vec::new(),
            DuplicatePolicy::KeepLast,
        );
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.merged(), 0);
    }

    #[test]
    fn merge_keeps_first_with_max_frequency() {
        let mut input = rows(&[("Fox", 1, 3), ("dog", 1, 1), ("fox", 1, 9)]);
        input[0].score = Some(0.7);
        input[2].score = Some(0.2);
        let corpus = Corpus::build(input, Vec::new(), DuplicatePolicy::Merge);
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.merged(), 1);
        let fox = &corpus.phrases()[0];
        assert_eq!(fox.text(), "fox");
        assert_eq!(fox.frequency(), 9);
        assert_eq!(fox.score(), Some(0.2));
    }

    #[test]
    fn maxima_of_empty_corpus_are_zero() {
        let corpus = Corpus::default();
        assert!(corpus.is_empty());
        assert_eq!(corpus.max_length(), 0);
        assert_eq!(corpus.max_frequency(), 0);
    }

    #[test]
    fn ancestors_walks_to_root() {
        let mut corpus = Corpus::build(
            rows(&[("a b", 2, 1), ("a b c", 3, 1), ("a b c d", 4, 1)]),
            Vec::new(),
            DuplicatePolicy::KeepLast,
        );
        corpus.phrases_mut()[1].set_link(Some(PhraseId(0)), 1);
        corpus.phrases_mut()[2].set_link(Some(PhraseId(1)), 2);
        let chain: Vec<_> = corpus.ancestors(PhraseId(2)).map(Phrase::id).collect();
        assert_eq!(chain, vec![PhraseId(1), PhraseId(0)]);
        assert_eq!(corpus.ancestors(PhraseId(0)).count(), 0);
    }

    #[test]
    fn extra_cells_follow_their_phrase_through_the_sort() {
        let mut long = RawPhrase::new("the quick fox", 3, 1);
        long.extra = vec!["web".to_string()];
        let mut short = RawPhrase::new("fox", 1, 9);
        short.extra = vec!["news".to_string()];
        let corpus = Corpus::build(vec![long, short], vec!["source".to_string()], DuplicatePolicy::KeepLast);

        assert_eq!(corpus.extra_columns(), ["source".to_string()]);
        assert_eq!(corpus.phrases()[0].extra(), ["news".to_string()]);
        assert_eq!(corpus.phrases()[1].extra(), ["web".to_string()]);
        assert_eq!(corpus.phrases()[1].clone(), corpus.phrases()[1]);
    }
}
