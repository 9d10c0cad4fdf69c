//! Core library for phrase-tree.
//!
//! Turns a flat table of mined phrases into a forest where each phrase hangs
//! under the longest known phrase obtained by trimming words from its start
//! or end, then compresses that forest for browsing.
//!
//! # Modules
//!
//! - [`normalize`] - Canonical phrase text
//! - [`corpus`] - The phrase table and its record type
//! - [`index`] - Whole-corpus text lookup
//! - [`link`] - Parent linking
//! - [`select`] - Interest scoring and visible-node selection
//! - [`tree`] - Owned forest materialization
//! - [`compress`] - Chain compression and display text
//! - [`hierarchy`] - The pipeline tying the stages together
//! - [`table`] - CSV input and output
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```
//! use phrase_tree_core::{Hierarchy, HierarchyOptions, table};
//!
//! let csv = "phrase,length,freq\n\
//!            brown fox,2,20\n\
//!            quick brown fox,3,10\n\
//!            the quick brown fox,4,5\n";
//! let hierarchy = Hierarchy::build(table::parse_csv(csv)?, &HierarchyOptions::default())?;
//!
//! let forest = hierarchy.visualize(100);
//! assert_eq!(forest.len(), 1);
//! assert_eq!(forest[0].phrase, "the quick brown fox");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
#![deny(unsafe_code)]

pub mod compress;
pub mod config;
pub mod corpus;
pub mod error;
pub mod hierarchy;
pub mod index;
pub mod link;
pub mod normalize;
pub mod select;
pub mod table;
pub mod tree;

pub use compress::{CompressedNode, PARENT_PLACEHOLDER};
pub use config::{Config, ConfigLoader, ConfigSources, DEFAULT_MAX_VISIBLE_NODES, LogLevel};
pub use corpus::{Corpus, DuplicatePolicy, Phrase, PhraseId, RawPhrase};
pub use error::{
    ConfigError, ConfigResult, HierarchyError, HierarchyResult, TableError, TableResult,
};
pub use hierarchy::{Hierarchy, HierarchyOptions, HierarchySummary};
pub use index::TextIndex;
pub use link::{MIN_PARENT_WORDS, ParentLinker};
