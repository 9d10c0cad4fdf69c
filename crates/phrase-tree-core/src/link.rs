//! Parent linking.
//!
//! A phrase's parent is the longest indexed phrase obtained by dropping
//! boundary words from either end. Candidates are tried with the fewest words
//! dropped first, and at each drop count the suffix (leading words removed)
//! is tried before the prefix (trailing words removed). The first hit wins.
//!
//! Because a candidate always has fewer words than the phrase it was cut
//! from, parents are strictly shorter than children and the relation is a
//! forest.

use serde::Serialize;

use crate::corpus::{Corpus, PhraseId};
use crate::error::{HierarchyError, HierarchyResult};
use crate::index::TextIndex;

/// Fewest words a parent candidate may have.
///
/// With the default of 2, a phrase of `l` words tries drops `1..=l-2`, so
/// one- and two-word phrases are always roots and single words never become
/// parents.
pub const MIN_PARENT_WORDS: usize = 2;

/// Which end of the phrase the parent was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Parent is the tail: leading words were dropped.
    Suffix,
    /// Parent is the head: trailing words were dropped.
    Prefix,
}

/// A successful parent lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentMatch {
    /// The parent phrase.
    pub parent: PhraseId,
    /// Which end matched.
    pub side: Side,
    /// How many boundary words were removed.
    pub dropped: usize,
}

/// Summary of a linking sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkReport {
    /// Phrases processed.
    pub phrases: usize,
    /// Phrases left without a parent.
    pub roots: usize,
    /// Phrases linked through a suffix.
    pub suffix_links: usize,
    /// Phrases linked through a prefix.
    pub prefix_links: usize,
    /// Deepest level assigned.
    pub max_level: usize,
}

impl LinkReport {
    /// Phrases that received a parent.
    pub const fn linked(&self) -> usize {
        self.suffix_links + self.prefix_links
    }
}

/// Assigns `parent_id` and `level` to every phrase of a corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLinker {
    min_parent_words: usize,
}

impl Default for ParentLinker {
    fn default() -> Self {
        Self {
            min_parent_words: MIN_PARENT_WORDS,
        }
    }
}

impl ParentLinker {
    /// Linker whose candidates keep at least `min_parent_words` words.
    pub const fn new(min_parent_words: usize) -> HierarchyResult<Self> {
        if min_parent_words == 0 {
            return Err(HierarchyError::InvalidMinParentWords(min_parent_words));
        }
        Ok(Self { min_parent_words })
    }

    /// Configured minimum parent length in words.
    pub const fn min_parent_words(&self) -> usize {
        self.min_parent_words
    }

    /// Find the parent of normalized `text`.
    pub fn find_parent(&self, text: &str, index: &TextIndex) -> Option<ParentMatch> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let len = words.len();
        let max_drop = len.saturating_sub(self.min_parent_words);

        for dropped in 1..=max_drop {
            let suffix = words[dropped..].join(" ");
            if let Some(parent) = index.get(&suffix) {
                return Some(ParentMatch {
                    parent,
                    side: Side::Suffix,
                    dropped,
                });
            }
            let prefix = words[..len - dropped].join(" ");
            if let Some(parent) = index.get(&prefix) {
                return Some(ParentMatch {
                    parent,
                    side: Side::Prefix,
                    dropped,
                });
            }
        }
        None
    }

    /// Link every phrase in the corpus.
    pub fn link(&self, corpus: &mut Corpus, index: &TextIndex) -> LinkReport {
        self.link_with_progress(corpus, index, |_, _| {})
    }

    /// Link every phrase, calling `on_progress` with the number of phrases
    /// decided so far and the total.
    ///
    /// Parent decisions read only the index, so they are made first for all
    /// phrases. Levels follow in a second pass ordered by word count, which
    /// guarantees a parent's level is final before any child reads it.
    #[tracing::instrument(skip_all, fields(phrases = corpus.len(), min_parent_words = self.min_parent_words))]
    pub fn link_with_progress<F>(
        &self,
        corpus: &mut Corpus,
        index: &TextIndex,
        mut on_progress: F,
    ) -> LinkReport
    where
        F: FnMut(usize, usize),
    {
        let total = corpus.len();
        let mut report = LinkReport {
            phrases: total,
            ..LinkReport::default()
        };

        let mut parents: Vec<Option<PhraseId>> = Vec::with_capacity(total);
        for (done, phrase) in corpus.phrases().iter().enumerate() {
            let found = self.find_parent(phrase.text(), index);
            match found.map(|m| m.side) {
                Some(Side::Suffix) => report.suffix_links += 1,
                Some(Side::Prefix) => report.prefix_links += 1,
                None => report.roots += 1,
            }
            parents.push(found.map(|m| m.parent));
            on_progress(done + 1, total);
        }

        let mut order: Vec<usize> = (0..total).collect();
        order.sort_by_key(|&i| corpus.phrases()[i].word_count());

        let mut levels = vec![0usize; total];
        for i in order {
            levels[i] = parents[i].map_or(0, |p| levels[p.index()] + 1);
        }

        for (phrase, (parent, level)) in corpus
            .phrases_mut()
            .iter_mut()
            .zip(parents.into_iter().zip(levels))
        {
            report.max_level = report.max_level.max(level);
            phrase.set_link(parent, level);
        }

        tracing::info!(
            roots = report.roots,
            suffix_links = report.suffix_links,
            prefix_links = report.prefix_links,
            max_level = report.max_level,
            "parents linked"
        );
        report
    }
}
