//! Self-contained HTML view of a compressed phrase forest.

use anyhow::Context;
use camino::Utf8Path;
use phrase_tree_core::CompressedNode;

const TEMPLATE: &str = include_str!("../assets/tree.html");
const DATA_SLOT: &str = "%DATA%";

/// Render the forest into a standalone HTML page.
///
/// The forest is embedded as a JSON literal inside a `<script>` element, so
/// every `<` is written as `\u003c` to keep phrase text from closing it.
pub fn render_html(forest: &[CompressedNode]) -> serde_json::Result<String> {
    let json = serde_json::to_string(forest)?.replace('<', "\\u003c");
    Ok(TEMPLATE.replacen(DATA_SLOT, &json, 1))
}

/// Render the forest and write it to `path`.
#[tracing::instrument(skip(forest), fields(roots = forest.len()))]
pub fn write_html(path: &Utf8Path, forest: &[CompressedNode]) -> anyhow::Result<()> {
    let html = render_html(forest).context("failed to serialize tree")?;
    std::fs::write(path, &html).with_context(|| format!("failed to write {path}"))?;
    tracing::debug!(%path, bytes = html.len(), "wrote html view");
    Ok(())
}
