//! Rendering for `ExecutionControl`'s `show_*` diagnostic opt-ins
//! (`spec.md` §6). Diagnostics are never written to a process-wide sink —
//! every function here takes the caller-supplied `&mut dyn Write` directly,
//! per the "Global state" design note's ban on the teacher's JSON
//! accumulator pattern.

use std::io::Write;

use itertools::Itertools;

use crate::layout::LaidOutLine;
use crate::tree::{PartitionId, TokenPartitionTree};

pub(crate) fn write_token_partition_tree(tree: &TokenPartitionTree, sink: &mut dyn Write) {
    let _ = writeln!(sink, "token-partition tree:");
    write_node(tree, tree.root, 0, sink);
}

fn write_node(tree: &TokenPartitionTree, id: PartitionId, depth: usize, sink: &mut dyn Write) {
    let node = tree.node(id);
    let _ = writeln!(
        sink,
        "{}[{:?}] tokens {}..{} indent={} expanded={}",
        "  ".repeat(depth),
        node.line.policy,
        node.line.start,
        node.line.end,
        node.line.indentation_spaces,
        node.expanded.get(),
    );
    for &child in &node.children {
        write_node(tree, child, depth + 1, sink);
    }
}

/// Writes the `n` largest laid-out lines by token count, descending —
/// a cheap way to spot an unwrapped line that's about to stress the
/// wrap search's `max_search_states` budget.
pub(crate) fn write_largest_token_partitions(lines: &[LaidOutLine], n: usize, sink: &mut dyn Write) {
    let indexed = lines
        .iter()
        .copied()
        .enumerate()
        .sorted_by_key(|(_, line)| std::cmp::Reverse(line.len()));
    let _ = writeln!(sink, "largest token partitions (top {n}):");
    for (index, line) in indexed.take(n) {
        let _ = writeln!(
            sink,
            "  #{index}: tokens {}..{} ({} tokens)",
            line.start,
            line.end,
            line.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::annotate;
    use crate::layout::lay_out;
    use crate::model::build_format_tokens;
    use crate::style::FormatStyle;
    use crate::tree::unwrap_tree;
    use sv_syntax::build_text_structure;

    #[test]
    fn tree_dump_mentions_every_top_level_policy() {
        let source = "module m(input a,input b);endmodule\n";
        let structure = build_text_structure(source).unwrap();
        let mut tokens = build_format_tokens(&structure.tokens);
        let style = FormatStyle::default();
        annotate(&mut tokens, &structure.cst, structure.source, &style);
        let tree = unwrap_tree(&structure.cst, &tokens, &style);

        let mut buf = Vec::new();
        write_token_partition_tree(&tree, &mut buf);
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("AlwaysExpand"));
    }

    #[test]
    fn largest_partitions_sorted_descending() {
        let source = "module m;\nassign x = a;\nassign y = a + b + c + d;\nendmodule\n";
        let structure = build_text_structure(source).unwrap();
        let mut tokens = build_format_tokens(&structure.tokens);
        let style = FormatStyle::default();
        annotate(&mut tokens, &structure.cst, structure.source, &style);
        let tree = unwrap_tree(&structure.cst, &tokens, &style);
        let lines = lay_out(&tree, &tokens, structure.source, &style);

        let mut buf = Vec::new();
        write_largest_token_partitions(&lines, 2, &mut buf);
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("top 2"));
    }
}
