//! Command implementations.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use phrase_tree_core::{
    Config, DuplicatePolicy, Hierarchy, HierarchyError, HierarchyOptions, table,
};

pub mod build;
pub mod info;
pub mod schema;
pub mod tree;

/// Input and filtering flags shared by `build` and `tree`.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Phrase table (CSV with phrase and freq columns).
    pub input: Utf8PathBuf,

    /// Maximum number of phrases selected for display.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Drop phrases with fewer words than this.
    #[arg(long, value_name = "N")]
    pub min_length: Option<usize>,

    /// Drop phrases seen in fewer documents than this.
    #[arg(long = "min-freq", value_name = "N")]
    pub min_frequency: Option<u64>,

    /// Fewest words a parent phrase may have.
    #[arg(long, value_name = "N")]
    pub min_parent_words: Option<usize>,

    /// How to handle phrases that normalize to the same text.
    #[arg(long, value_enum)]
    pub duplicate_policy: Option<DuplicatePolicy>,
}

impl PipelineArgs {
    /// Flags layered over the loaded configuration.
    pub fn options(&self, config: &Config) -> HierarchyOptions {
        let base = config.hierarchy_options();
        HierarchyOptions {
            min_length: self.min_length.unwrap_or(base.min_length),
            min_frequency: self.min_frequency.unwrap_or(base.min_frequency),
            min_parent_words: self.min_parent_words.unwrap_or(base.min_parent_words),
            duplicate_policy: self.duplicate_policy.unwrap_or(base.duplicate_policy),
        }
    }

    /// Effective display cap.
    pub fn limit(&self, config: &Config) -> usize {
        self.limit.unwrap_or_else(|| config.max_visible_nodes())
    }
}

/// Load the input table and link it.
///
/// Returns `Ok(None)` after telling the user when filtering leaves nothing
/// to link. The progress bar is hidden when `quiet` is set.
pub fn load_hierarchy(
    args: &PipelineArgs,
    config: &Config,
    quiet: bool,
) -> anyhow::Result<Option<Hierarchy>> {
    let table = table::read_csv(&args.input)
        .with_context(|| format!("failed to load phrases from {}", args.input))?;
    let options = args.options(config);

    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(table.len() as u64)
    };
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .context("invalid progress template")?,
    );
    bar.set_message("linking");

    let built = Hierarchy::build_with_progress(table, &options, |done, total| {
        bar.set_length(total as u64);
        bar.set_position(done as u64);
    });
    bar.finish_and_clear();

    match built {
        Ok(hierarchy) => Ok(Some(hierarchy)),
        Err(HierarchyError::NothingToProcess) => {
            eprintln!("No phrases match the specified criteria");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}
