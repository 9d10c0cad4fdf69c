//! Materializing parent pointers into an owned forest.

use std::collections::{BTreeSet, HashMap};

use crate::corpus::{Corpus, Phrase, PhraseId};

/// A phrase and the subtrees hanging below it.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// The phrase at this node.
    pub phrase: Phrase,
    /// Child subtrees, exclusively owned.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// A node with no children.
    pub const fn leaf(phrase: Phrase) -> Self {
        Self {
            phrase,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Self::size).sum::<usize>()
    }

    /// Reorder siblings by descending frequency at every depth.
    ///
    /// The sort is stable, so equally frequent siblings keep id order.
    pub fn sort_by_frequency(&mut self) {
        sort_forest_by_frequency(&mut self.children);
    }
}

/// Reorder a forest by descending frequency at every depth.
pub fn sort_forest_by_frequency(forest: &mut [TreeNode]) {
    forest.sort_by(|a, b| b.phrase.frequency().cmp(&a.phrase.frequency()));
    for node in forest {
        node.sort_by_frequency();
    }
}

/// Build the forest for the phrases in `visible`.
///
/// A phrase whose parent is outside `visible` becomes a root. Children and
/// roots are ordered by ascending id.
#[tracing::instrument(skip_all, fields(visible = visible.len()))]
pub fn materialize(corpus: &Corpus, visible: &BTreeSet<PhraseId>) -> Vec<TreeNode> {
    let mut children: HashMap<PhraseId, Vec<PhraseId>> = HashMap::new();
    let mut roots = Vec::new();

    for &id in visible {
        let Some(phrase) = corpus.get(id) else {
            continue;
        };
        match phrase.parent_id() {
            Some(parent) if visible.contains(&parent) => {
                children.entry(parent).or_default().push(id);
            }
            _ => roots.push(id),
        }
    }

    tracing::debug!(roots = roots.len(), "forest materialized");
    roots
        .into_iter()
        .filter_map(|id| build_node(corpus, id, &mut children))
        .collect()
}

/// Build the forest for every phrase in the corpus.
pub fn materialize_all(corpus: &Corpus) -> Vec<TreeNode> {
    let all = corpus.phrases().iter().map(Phrase::id).collect();
    materialize(corpus, &all)
}

fn build_node(
    corpus: &Corpus,
    id: PhraseId,
    children: &mut HashMap<PhraseId, Vec<PhraseId>>,
) -> Option<TreeNode> {
    let phrase = corpus.get(id)?.clone();
    let child_ids = children.remove(&id).unwrap_or_default();
    Some(TreeNode {
        phrase,
        children: child_ids
            .into_iter()
            .filter_map(|child| build_node(corpus, child, children))
            .collect(),
    })
}
