//! Build command: link a phrase table and write its outputs.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use phrase_tree_core::{CompressedNode, Config, HierarchySummary, table};
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::{PipelineArgs, load_hierarchy};
use crate::render;

/// Arguments for the `build` subcommand.
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Enriched phrase table to write.
    #[arg(short, long, default_value = "results_tree.csv")]
    pub output: Utf8PathBuf,

    /// HTML tree view to write.
    #[arg(long, default_value = "visualization.html", conflicts_with = "no_html")]
    pub html: Utf8PathBuf,

    /// Skip the HTML tree view.
    #[arg(long)]
    pub no_html: bool,

    /// Also write the compressed tree as JSON.
    #[arg(long, value_name = "FILE")]
    pub tree_json: Option<Utf8PathBuf>,
}

/// Outcome of a build, printed with `--json`.
#[derive(Debug, Serialize)]
pub struct BuildReport {
    /// Input table.
    pub input: Utf8PathBuf,
    /// Enriched table written.
    pub output: Utf8PathBuf,
    /// HTML view written, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<Utf8PathBuf>,
    /// Compressed tree JSON written, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_json: Option<Utf8PathBuf>,
    /// Phrases selected for display before ancestor closure.
    pub limit: usize,
    /// Root count of the compressed tree.
    pub roots: usize,
    /// Node count of the compressed tree.
    pub visible_nodes: usize,
    /// Linking statistics.
    #[serde(flatten)]
    pub summary: HierarchySummary,
}

/// Run the full pipeline and write the enriched table and tree views.
#[instrument(name = "cmd_build", skip_all, fields(input = %args.pipeline.input))]
pub fn cmd_build(
    args: BuildArgs,
    global_json: bool,
    quiet: bool,
    config: &Config,
) -> anyhow::Result<()> {
    debug!(output = %args.output, no_html = args.no_html, "executing build command");

    let Some(hierarchy) = load_hierarchy(&args.pipeline, config, quiet || global_json)? else {
        return Ok(());
    };

    table::write_csv(&args.output, hierarchy.corpus())
        .with_context(|| format!("failed to write {}", args.output))?;
    info!(path = %args.output, rows = hierarchy.corpus().len(), "wrote enriched table");

    let limit = args.pipeline.limit(config);
    let forest = hierarchy.visualize(limit);

    let html = if args.no_html {
        None
    } else {
        render::write_html(&args.html, &forest)?;
        Some(args.html)
    };

    if let Some(ref path) = args.tree_json {
        let json = serde_json::to_string_pretty(&forest)?;
        std::fs::write(path, json).with_context(|| format!("failed to write {path}"))?;
    }

    let report = BuildReport {
        input: args.pipeline.input,
        output: args.output,
        html,
        tree_json: args.tree_json,
        limit,
        roots: forest.len(),
        visible_nodes: forest.iter().map(CompressedNode::size).sum(),
        summary: hierarchy.summary().clone(),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !quiet {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &BuildReport) {
    let link = &report.summary.link;
    println!(
        "{} {} phrases, {} linked ({} suffix, {} prefix), {} roots, depth {}",
        "Linked".green().bold(),
        link.phrases,
        link.linked(),
        link.suffix_links,
        link.prefix_links,
        link.roots,
        link.max_level,
    );
    if report.summary.filtered_rows > 0 {
        println!(
            "{}: {}",
            "Filtered out".dimmed(),
            report.summary.filtered_rows
        );
    }
    if report.summary.dropped_rows > 0 {
        println!(
            "{}: {}",
            "Unreadable rows".yellow(),
            report.summary.dropped_rows
        );
    }
    if report.summary.merged_rows > 0 {
        println!("{}: {}", "Merged duplicates".dimmed(), report.summary.merged_rows);
    }
    if !report.summary.collisions.is_empty() {
        println!(
            "{}: {}",
            "Duplicate texts".yellow(),
            report.summary.collisions.len()
        );
    }
    println!("{}: {}", "Table".dimmed(), report.output.cyan());
    if let Some(ref html) = report.html {
        println!(
            "{}: {} ({} nodes)",
            "Tree view".dimmed(),
            html.cyan(),
            report.visible_nodes
        );
    }
    if let Some(ref json) = report.tree_json {
        println!("{}: {}", "Tree JSON".dimmed(), json.cyan());
    }
}
