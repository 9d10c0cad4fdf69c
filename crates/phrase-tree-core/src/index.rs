//! Whole-corpus text lookup.

use std::collections::HashMap;

use serde::Serialize;

use crate::corpus::{Corpus, PhraseId};

/// Two phrases that normalize to the same text.
///
/// Only `kept` is addressable as a parent; `shadowed` still gets a parent of
/// its own but can never be one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    /// The shared normalized text.
    pub text: String,
    /// The phrase the index resolves the text to.
    pub kept: PhraseId,
    /// The phrase hidden behind `kept`.
    pub shadowed: PhraseId,
}

/// Normalized text → phrase id, built from the entire corpus before linking.
///
/// The index is immutable once built, so every linking decision sees the
/// same view of the data no matter which phrase is processed first.
#[derive(Debug, Clone, Default)]
pub struct TextIndex {
    ids: HashMap<String, PhraseId>,
    collisions: Vec<Collision>,
}

impl TextIndex {
    /// Index every phrase in the corpus.
    ///
    /// When two phrases share a text, the one indexed last (highest id) wins
    /// and the other is recorded as a [`Collision`].
    #[tracing::instrument(skip_all, fields(phrases = corpus.len()))]
    pub fn build(corpus: &Corpus) -> Self {
        let mut ids = HashMap::with_capacity(corpus.len());
        let mut collisions = Vec::new();

        for phrase in corpus.phrases() {
            if let Some(previous) = ids.insert(phrase.text().to_string(), phrase.id()) {
                tracing::warn!(
                    phrase = phrase.text(),
                    kept = %phrase.id(),
                    shadowed = %previous,
                    "duplicate phrase text; earlier row cannot be a parent"
                );
                collisions.push(Collision {
                    text: phrase.text().to_string(),
                    kept: phrase.id(),
                    shadowed: previous,
                });
            }
        }

        Self { ids, collisions }
    }

    /// Resolve normalized text to a phrase id.
    pub fn get(&self, text: &str) -> Option<PhraseId> {
        self.ids.get(text).copied()
    }

    /// Duplicate texts found while building.
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    /// Number of distinct texts.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{DuplicatePolicy, RawPhrase};

    fn corpus(items: &[(&str, usize)]) -> Corpus {
        let rows = items
            .iter()
            .map(|&(t, l)| RawPhrase::new(t, l, 1))
            .collect();
        Corpus::build(rows, Vec::new(), DuplicatePolicy::KeepLast)
    }

    #[test]
    fn resolves_normalized_text() {
        let c = corpus(&[("Brown Fox", 2), ("fox", 1)]);
        let index = TextIndex::build(&c);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("brown fox"), Some(PhraseId(1)));
        assert_eq!(index.get("fox"), Some(PhraseId(0)));
        assert_eq!(index.get("Brown Fox"), None);
        assert!(index.collisions().is_empty());
    }

    #[test]
    fn last_indexed_duplicate_wins() {
        let c = corpus(&[("fox", 1), ("FOX", 1)]);
        let index = TextIndex::build(&c);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("fox"), Some(PhraseId(1)));
        assert_eq!(
            index.collisions(),
            &[Collision {
                text: "fox".to_string(),
                kept: PhraseId(1),
                shadowed: PhraseId(0),
            }]
        );
    }

    #[test]
    fn empty_corpus_gives_empty_index() {
        let index = TextIndex::build(&Corpus::default());
        assert!(index.is_empty());
    }
}
