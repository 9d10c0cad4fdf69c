//! Tree command: print the compressed phrase tree.

use clap::Args;
use owo_colors::{OwoColorize, Stream};
use phrase_tree_core::{CompressedNode, Config, PARENT_PLACEHOLDER};
use tracing::{debug, instrument};

use super::{PipelineArgs, load_hierarchy};

/// Arguments for the `tree` subcommand.
#[derive(Args, Debug)]
pub struct TreeArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Link a phrase table and print its compressed tree.
#[instrument(name = "cmd_tree", skip_all, fields(input = %args.pipeline.input))]
pub fn cmd_tree(
    args: TreeArgs,
    global_json: bool,
    quiet: bool,
    config: &Config,
) -> anyhow::Result<()> {
    debug!(limit = ?args.pipeline.limit, "executing tree command");

    let Some(hierarchy) = load_hierarchy(&args.pipeline, config, quiet || global_json)? else {
        return Ok(());
    };
    let forest = hierarchy.visualize(args.pipeline.limit(config));

    if global_json {
        println!("{}", serde_json::to_string_pretty(&forest)?);
    } else {
        let mut out = String::new();
        for root in &forest {
            write_node(&mut out, root, 0);
        }
        print!("{out}");
    }
    Ok(())
}

fn write_node(out: &mut String, node: &CompressedNode, depth: usize) {
    use std::fmt::Write;

    let marker = PARENT_PLACEHOLDER
        .if_supports_color(Stream::Stdout, |t| t.dimmed())
        .to_string();
    let label = node.display_phrase.replace(PARENT_PLACEHOLDER, &marker);
    let badge = format!("F:{} L:{}", node.freq, node.length);
    let _ = writeln!(
        out,
        "{:indent$}{} {}",
        "",
        label,
        badge.if_supports_color(Stream::Stdout, |t| t.dimmed()),
        indent = depth * 2,
    );
    for child in &node.children {
        write_node(out, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phrase_tree_core::PhraseId;

    fn node(display: &str, freq: u64, children: Vec<CompressedNode>) -> CompressedNode {
        CompressedNode {
            id: PhraseId(0),
            phrase: display.to_string(),
            display_phrase: display.to_string(),
            freq,
            length: 2,
            level: 0,
            children,
        }
    }

    #[test]
    fn indents_children() {
        owo_colors::set_override(false);
        let tree = node(
            "brown fox",
            20,
            vec![node("quick <PARENT>", 10, vec![]), node("<PARENT> ran", 4, vec![])],
        );
        let mut out = String::new();
        write_node(&mut out, &tree, 0);
        assert_eq!(
            out,
            "brown fox F:20 L:2\n  quick <PARENT> F:10 L:2\n  <PARENT> ran F:4 L:2\n"
        );
    }
}
