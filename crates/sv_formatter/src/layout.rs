//! Layout pass — decides which token-partition nodes actually render as
//! their own line versus collapsing into their parent's, and reshapes
//! `AppendFittingSubPartitions` nodes that must expand (`spec.md` §4.4,
//! §4.4.1).
//!
//! The output is a flat, ordered list of [`LaidOutLine`]s: each is handed
//! to the wrap search (`search.rs`) independently.

use crate::model::{FormatToken, FormatTokenIndex};
use crate::style::FormatStyle;
use crate::tree::{PartitionId, PartitionPolicy, TokenPartitionTree, UnwrappedLine};

/// One final unwrapped line, after all policy decisions have been
/// resolved. Unlike [`UnwrappedLine`] this no longer carries a policy —
/// by the time it exists, its extent and indentation are fixed.
#[derive(Debug, Clone, Copy)]
pub struct LaidOutLine {
    pub start: FormatTokenIndex,
    pub end: FormatTokenIndex,
    pub indentation_spaces: u32,
}

impl LaidOutLine {
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn len(self) -> usize {
        (self.end - self.start) as usize
    }
}

impl From<UnwrappedLine> for LaidOutLine {
    fn from(line: UnwrappedLine) -> Self {
        Self {
            start: line.start,
            end: line.end,
            indentation_spaces: line.indentation_spaces,
        }
    }
}

/// Runs the full expand-or-collapse decision over the tree and returns the
/// resulting sequence of lines in source order.
pub fn lay_out(
    tree: &TokenPartitionTree,
    tokens: &[FormatToken],
    source: &str,
    style: &FormatStyle,
) -> Vec<LaidOutLine> {
    mark_expanded(tree, tree.root, tokens, source, style);
    let mut out = Vec::new();
    emit(tree, tree.root, tokens, source, style, &mut out);
    out
}

/// Post-order: a node expands if its policy demands it unconditionally
/// (`AlwaysExpand`), or if it doesn't fit collapsed onto one physical line
/// and its policy allows expanding (`FitOnLineElseExpand`,
/// `AppendFittingSubPartitions`), or if any child was already forced to
/// expand (a node cannot stay collapsed once part of it must break).
fn mark_expanded(
    tree: &TokenPartitionTree,
    id: PartitionId,
    tokens: &[FormatToken],
    source: &str,
    style: &FormatStyle,
) -> bool {
    let node = tree.node(id);
    if node.is_leaf() {
        node.expanded.set(false);
        return false;
    }

    let mut any_child_expanded = false;
    for &child in &node.children {
        if mark_expanded(tree, child, tokens, source, style) {
            any_child_expanded = true;
        }
    }

    let expand = match node.line.policy {
        PartitionPolicy::AlwaysExpand => true,
        // Never assigned by `unwrap_tree` today (see `PartitionPolicy::Inline`'s
        // doc comment); collapsing is the conservative default for an
        // interior node that exists solely to group.
        PartitionPolicy::Inline => false,
        PartitionPolicy::FitOnLineElseExpand | PartitionPolicy::AppendFittingSubPartitions => {
            any_child_expanded || !fits(node.line, tokens, source, style)
        }
    };
    node.expanded.set(expand);
    expand
}

fn emit(
    tree: &TokenPartitionTree,
    id: PartitionId,
    tokens: &[FormatToken],
    source: &str,
    style: &FormatStyle,
    out: &mut Vec<LaidOutLine>,
) {
    let node = tree.node(id);
    if node.line.is_empty() {
        // Trailing-empty trimming: a degenerate zero-width partition (e.g.
        // a node whose children exactly cover its own range) contributes
        // no output line of its own.
        return;
    }
    if !node.expanded.get() {
        out.push(node.line.into());
        return;
    }

    match node.line.policy {
        PartitionPolicy::AppendFittingSubPartitions => {
            reshape(tree, &node.children, tokens, source, style, out);
        }
        _ => {
            for &child in &node.children {
                emit(tree, child, tokens, source, style, out);
            }
        }
    }
}

/// `spec.md` §4.4.1's reshape: greedily packs consecutive collapsed
/// children onto one physical line as long as the running line still fits
/// the column limit, starting a fresh line (at that child's own
/// indentation) the moment it would not. A child that itself needed to
/// expand (e.g. an argument that is itself an oversized instantiation)
/// flushes whatever was pending and recurses instead of being packed.
fn reshape(
    tree: &TokenPartitionTree,
    children: &[PartitionId],
    tokens: &[FormatToken],
    source: &str,
    style: &FormatStyle,
    out: &mut Vec<LaidOutLine>,
) {
    let mut current: Option<LaidOutLine> = None;

    for &child in children {
        let child_node = tree.node(child);
        if child_node.line.is_empty() {
            continue;
        }
        if child_node.expanded.get() {
            if let Some(line) = current.take() {
                out.push(line);
            }
            emit(tree, child, tokens, source, style, out);
            continue;
        }

        match current {
            None => current = Some(child_node.line.into()),
            Some(acc) => {
                let candidate = LaidOutLine {
                    start: acc.start,
                    end: child_node.line.end,
                    indentation_spaces: acc.indentation_spaces,
                };
                if fits_line(candidate, tokens, source, style) {
                    current = Some(candidate);
                } else {
                    out.push(acc);
                    current = Some(child_node.line.into());
                }
            }
        }
    }

    if let Some(line) = current {
        out.push(line);
    }
}

fn fits(line: UnwrappedLine, tokens: &[FormatToken], source: &str, style: &FormatStyle) -> bool {
    fits_line(line.into(), tokens, source, style)
}

fn fits_line(line: LaidOutLine, tokens: &[FormatToken], source: &str, style: &FormatStyle) -> bool {
    line.indentation_spaces + flattened_width(line, tokens, source) <= style.column_limit
}

/// The width the line's tokens would occupy if joined on one physical
/// line using each token's required spacing (ignoring any break
/// decision) — the same quantity the search's own cost function measures
/// per candidate line, used here only to decide whether a collapse is
/// worth attempting at all.
fn flattened_width(line: LaidOutLine, tokens: &[FormatToken], source: &str) -> u32 {
    let mut width = 0u32;
    for i in line.start..line.end {
        let token = &tokens[i as usize];
        if i > line.start {
            width += token.before.spaces_required;
        }
        width += token.width(source);
    }
    width
}
