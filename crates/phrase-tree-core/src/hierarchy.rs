//! End-to-end pipeline: sanitized table in, linked corpus and compressed
//! forest out.

use serde::Serialize;

use crate::compress::{CompressedNode, compress, sort_compressed_by_frequency};
use crate::corpus::{Corpus, DuplicatePolicy};
use crate::error::{HierarchyError, HierarchyResult};
use crate::index::{Collision, TextIndex};
use crate::link::{LinkReport, MIN_PARENT_WORDS, ParentLinker};
use crate::select::select_visible;
use crate::table::PhraseTable;
use crate::tree::{TreeNode, materialize};

/// Knobs applied before and during linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchyOptions {
    /// Drop phrases shorter than this many words.
    pub min_length: usize,
    /// Drop phrases seen in fewer documents than this.
    pub min_frequency: u64,
    /// Fewest words a parent may have.
    pub min_parent_words: usize,
    /// Handling of rows that normalize to the same text.
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for HierarchyOptions {
    fn default() -> Self {
        Self {
            min_length: 0,
            min_frequency: 0,
            min_parent_words: MIN_PARENT_WORDS,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

/// What happened while building a hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HierarchySummary {
    /// Rows handed to the builder.
    pub input_rows: usize,
    /// Rows the loader dropped for missing or malformed cells.
    pub dropped_rows: usize,
    /// Rows removed by the length and frequency filters.
    pub filtered_rows: usize,
    /// Rows merged into an identical phrase.
    pub merged_rows: usize,
    /// Phrases sharing a text with a later phrase.
    pub collisions: Vec<Collision>,
    /// Linking statistics.
    pub link: LinkReport,
}

/// A linked corpus together with the index it was linked against.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    corpus: Corpus,
    index: TextIndex,
    summary: HierarchySummary,
}

impl Hierarchy {
    /// Filter, index and link a table.
    pub fn build(table: PhraseTable, options: &HierarchyOptions) -> HierarchyResult<Self> {
        Self::build_with_progress(table, options, |_, _| {})
    }

    /// Like [`Hierarchy::build`], reporting linking progress.
    ///
    /// Returns [`HierarchyError::NothingToProcess`] when no row survives
    /// filtering; no index is built in that case.
    #[tracing::instrument(skip_all, fields(rows = table.len()))]
    pub fn build_with_progress<F>(
        mut table: PhraseTable,
        options: &HierarchyOptions,
        on_progress: F,
    ) -> HierarchyResult<Self>
    where
        F: FnMut(usize, usize),
    {
        let linker = ParentLinker::new(options.min_parent_words)?;
        let input_rows = table.len();

        let filtered_rows = table.retain_min(options.min_length, options.min_frequency);
        if filtered_rows > 0 {
            tracing::info!(
                from = input_rows,
                to = table.len(),
                min_length = options.min_length,
                min_frequency = options.min_frequency,
                "filtered phrases"
            );
        }

        let dropped_rows = table.dropped;
        let mut corpus = Corpus::build(table.rows, table.extra_columns, options.duplicate_policy);
        if corpus.is_empty() {
            return Err(HierarchyError::NothingToProcess);
        }

        let index = TextIndex::build(&corpus);
        if !index.collisions().is_empty() {
            tracing::warn!(
                collisions = index.collisions().len(),
                "phrases share normalized text; set duplicate_policy = \"merge\" to combine them"
            );
        }
        let link = linker.link_with_progress(&mut corpus, &index, on_progress);

        let summary = HierarchySummary {
            input_rows,
            dropped_rows,
            filtered_rows,
            merged_rows: corpus.merged(),
            collisions: index.collisions().to_vec(),
            link,
        };
        Ok(Self {
            corpus,
            index,
            summary,
        })
    }

    /// The linked phrases.
    pub const fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// The text index used for linking.
    pub const fn index(&self) -> &TextIndex {
        &self.index
    }

    /// Build statistics.
    pub const fn summary(&self) -> &HierarchySummary {
        &self.summary
    }

    /// The uncompressed forest of the `max_visible` best phrases and their
    /// ancestors.
    pub fn visible_forest(&self, max_visible: usize) -> Vec<TreeNode> {
        let visible = select_visible(&self.corpus, max_visible);
        materialize(&self.corpus, &visible)
    }

    /// The compressed forest for display, siblings by descending frequency.
    #[tracing::instrument(skip(self))]
    pub fn visualize(&self, max_visible: usize) -> Vec<CompressedNode> {
        let mut forest = compress(self.visible_forest(max_visible));
        sort_compressed_by_frequency(&mut forest);
        forest
    }
}
