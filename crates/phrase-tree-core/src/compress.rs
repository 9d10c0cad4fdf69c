//! Chain compression.
//!
//! A run of nodes that each have exactly one child adds depth without adding
//! choice. Compression replaces such a run by the node it ends in (the first
//! node with zero or several children) and rewrites each surviving node's
//! text relative to its nearest surviving ancestor.
//!
//! Both passes consume the input forest and build a new one; nothing is
//! edited in place.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::corpus::PhraseId;
use crate::tree::TreeNode;

/// Marker substituted for the ancestor's text in display strings.
pub const PARENT_PLACEHOLDER: &str = "<PARENT>";

/// A node of the compressed tree, ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompressedNode {
    /// Id of the phrase this node shows.
    pub id: PhraseId,
    /// Full normalized phrase text.
    pub phrase: String,
    /// Text with the nearest visible ancestor replaced by `<PARENT>`.
    pub display_phrase: String,
    /// Document frequency of this phrase.
    pub freq: u64,
    /// Word count of this phrase.
    pub length: usize,
    /// Depth of this phrase in the uncompressed forest.
    pub level: usize,
    /// Compressed children.
    pub children: Vec<CompressedNode>,
}

impl CompressedNode {
    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Self::size).sum::<usize>()
    }

    /// Reorder siblings by descending frequency at every depth.
    pub fn sort_by_frequency(&mut self) {
        sort_compressed_by_frequency(&mut self.children);
    }
}

/// Reorder a compressed forest by descending frequency at every depth.
pub fn sort_compressed_by_frequency(forest: &mut [CompressedNode]) {
    forest.sort_by(|a, b| b.freq.cmp(&a.freq));
    for node in forest {
        node.sort_by_frequency();
    }
}

/// Collapse every single-child run into its landing node.
///
/// Nodes in the result have either no children or at least two.
pub fn collapse_chains(forest: Vec<TreeNode>) -> Vec<TreeNode> {
    forest
        .into_iter()
        .map(|node| {
            let landing = descend_chain(node);
            TreeNode {
                phrase: landing.phrase,
                children: collapse_chains(landing.children),
            }
        })
        .collect()
}

/// Collapse chains and compute display text for every surviving node.
#[tracing::instrument(skip_all, fields(roots = forest.len()))]
pub fn compress(forest: Vec<TreeNode>) -> Vec<CompressedNode> {
    let compressed = compress_under(forest, None);
    tracing::debug!(
        nodes = compressed.iter().map(CompressedNode::size).sum::<usize>(),
        "forest compressed"
    );
    compressed
}

fn compress_under(forest: Vec<TreeNode>, ancestor: Option<&str>) -> Vec<CompressedNode> {
    forest
        .into_iter()
        .map(|node| {
            let landing = descend_chain(node);
            let phrase = landing.phrase;
            let display_phrase = display_text(phrase.text(), ancestor);
            let children = compress_under(landing.children, Some(phrase.text()));
            CompressedNode {
                id: phrase.id(),
                display_phrase,
                freq: phrase.frequency(),
                length: phrase.length(),
                level: phrase.level(),
                phrase: phrase.text().to_string(),
                children,
            }
        })
        .collect()
}

/// Follow single children down to the first node with zero or several.
fn descend_chain(mut node: TreeNode) -> TreeNode {
    while node.children.len() == 1 {
        node = node.children.swap_remove(0);
    }
    node
}

/// Text shown for `text` under `ancestor`.
///
/// Every literal occurrence of the ancestor text is replaced by
/// [`PARENT_PLACEHOLDER`]; without an ancestor, or when it does not occur,
/// the full text is shown.
pub fn display_text(text: &str, ancestor: Option<&str>) -> String {
    match ancestor {
        Some(a) if !a.is_empty() && text.contains(a) => {
            normalize_spacing(&text.replace(a, &format!(" {PARENT_PLACEHOLDER} ")))
        }
        _ => text.to_string(),
    }
}

fn normalize_spacing(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
