//! Error types for phrase-tree-core.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while reading or writing a phrase table.
#[derive(Error, Debug)]
pub enum TableError {
    /// The table file could not be read or written.
    #[error("failed to access {path}")]
    Io {
        /// Path of the file being accessed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The input could not be parsed into CSV rows.
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent, even after remapping alternate names.
    #[error("missing required column: {name}")]
    MissingColumn {
        /// Canonical name of the missing column.
        name: &'static str,
    },
}

/// Result type alias using [`TableError`].
pub type TableResult<T> = Result<T, TableError>;

/// Errors that can occur while building the phrase hierarchy.
#[derive(Error, Debug)]
pub enum HierarchyError {
    /// Nothing survived sanitization and filtering.
    #[error("no phrases match the specified criteria")]
    NothingToProcess,

    /// The minimum parent length must leave at least one word.
    #[error("min_parent_words must be at least 1 (got {0})")]
    InvalidMinParentWords(usize),
}

/// Result type alias using [`HierarchyError`].
pub type HierarchyResult<T> = Result<T, HierarchyError>;
