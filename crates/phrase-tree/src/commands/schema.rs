//! Schema command: describe the compressed tree's JSON shape.

use clap::Args;
use phrase_tree_core::CompressedNode;
use tracing::{debug, instrument};

/// Arguments for the `schema` subcommand.
#[derive(Args, Debug, Default)]
pub struct SchemaArgs {}

/// Print the JSON schema of a compressed tree node.
///
/// `tree --json` and `build --tree-json` emit an array of these nodes.
#[instrument(name = "cmd_schema", skip_all)]
pub fn cmd_schema(_args: SchemaArgs) -> anyhow::Result<()> {
    debug!("executing schema command");
    println!("{}", schema_json()?);
    Ok(())
}

fn schema_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&schemars::schema_for!(CompressedNode))
}
