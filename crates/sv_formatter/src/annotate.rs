//! Annotator — populates each format-token's `before` record from
//! style-keyed defaults plus syntactic-context overrides (`spec.md` §4.1).

use rustc_hash::FxHashSet;

use sv_syntax::{Cst, CstId, NonterminalKind, TokenKind};

use crate::model::{BeforeSpacing, BreakDecision, FormatToken};
use crate::style::{penalty_band, FormatStyle};

/// Walks the whole format-token sequence and fills in every token's
/// `before` record in place. Never fails (`spec.md` §4.1 "Failure: None").
pub fn annotate(tokens: &mut [FormatToken], cst: &Cst, source: &str, style: &FormatStyle) {
    let enclosing = enclosing_kinds(cst, tokens.len());
    let (list_wrap_start, list_dedent) = multi_item_list_breaks(cst);

    // Running bracket/paren/brace depth, used to tell a `for (;;)` header's
    // internal semicolons (depth > 0) from a statement-terminating one.
    let mut paren_depth: i32 = 0;

    for i in 0..tokens.len() {
        let cur_kind = tokens[i].kind();
        match cur_kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => paren_depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => paren_depth -= 1,
            _ => {}
        }

        if i == 0 {
            // The first token of the line is always appended at the line's
            // starting column (`spec.md` §4.4.2 "no leading break"); the
            // `before` record is otherwise unused for it.
            continue;
        }

        let prev_kind = tokens[i - 1].kind();
        let ctx = enclosing[i];
        let prev_end = tokens[i - 1].token.range.end();
        let cur_start = tokens[i].token.range.start();
        let same_line = !source[prev_end.to_usize()..cur_start.to_usize()].contains('\n');

        let mut spacing = default_spacing(prev_kind, cur_kind, ctx, style);

        if list_wrap_start.contains(&(i as u32)) {
            // First item of a port/parameter list that has more than one
            // item: the whole list expands, so even the item right after
            // the opening `(`/`#(` starts its own line (`spec.md` §4.3,
            // scenario 1).
            spacing.break_decision = BreakDecision::MustWrap;
        } else if list_dedent.contains(&(i as u32)) {
            // Closing `)` of the same list: dedents back to the header's
            // own indentation rather than trailing the last item.
            spacing.break_decision = BreakDecision::MustWrapDedent;
        } else if cur_kind.is_comment() {
            spacing = comment_spacing(cur_kind, same_line, spacing);
        } else if cur_kind == TokenKind::Preprocessor {
            spacing.break_decision = BreakDecision::MustWrap;
        } else if prev_kind.is_comment() {
            // A line comment always runs to end-of-line; whatever follows
            // it is necessarily on a new line. A block comment only forces
            // a wrap if the source already had one (mid-expression block
            // comments stay joinable).
            if prev_kind == TokenKind::LineComment || !same_line {
                spacing.break_decision = BreakDecision::MustWrap;
            }
        } else if cur_kind == TokenKind::Comma {
            spacing.spaces_required = 0;
            spacing.break_decision = BreakDecision::MustAppend;
        } else if prev_kind == TokenKind::Comma {
            spacing.spaces_required = 1;
            spacing.break_decision = BreakDecision::Undecided;
            spacing.break_penalty = penalty_band::SOFT;
        } else if cur_kind == TokenKind::Semicolon {
            spacing.spaces_required = 0;
            spacing.break_decision = BreakDecision::MustAppend;
        } else if prev_kind == TokenKind::Semicolon {
            spacing.break_decision = if paren_depth > 0 {
                BreakDecision::MustAppend
            } else {
                BreakDecision::MustWrap
            };
        } else if is_atomic_join(prev_kind, cur_kind, ctx) {
            spacing.spaces_required = 0;
            spacing.break_decision = BreakDecision::Undecided;
            spacing.break_penalty = penalty_band::ATOMIC;
        }

        tokens[i].before = spacing;
    }
}

/// Style-driven default for one adjacent pair, before context overrides.
fn default_spacing(
    prev: TokenKind,
    cur: TokenKind,
    _ctx: NonterminalKind,
    style: &FormatStyle,
) -> BeforeSpacing {
    let spaces_required = match (prev, cur) {
        (TokenKind::LParen, _) | (_, TokenKind::RParen) => 0,
        (TokenKind::LBracket, _) | (_, TokenKind::RBracket) => 0,
        (_, TokenKind::LBracket) => 0,
        // `{`/`}` delimit a concatenation or replication expression;
        // `space_around_concatenation` controls `{ a, b }` vs `{a, b}`.
        (TokenKind::LBrace, _) | (_, TokenKind::RBrace) if !style.space_around_concatenation => 0,
        (TokenKind::Identifier | TokenKind::SystemIdentifier, TokenKind::LParen) => 0,
        (_, TokenKind::Dot) | (TokenKind::Dot, _) => 0,
        (_, TokenKind::Colon) => 0,
        (TokenKind::At, _) => 0,
        (TokenKind::Hash, _) => 0,
        (_, TokenKind::Hash) => 1,
        (TokenKind::Question, _) | (_, TokenKind::Question) => 1,
        _ => 1,
    };

    BeforeSpacing {
        spaces_required,
        break_decision: BreakDecision::Undecided,
        break_penalty: penalty_band::MEDIUM,
    }
}

fn comment_spacing(kind: TokenKind, same_line: bool, mut spacing: BeforeSpacing) -> BeforeSpacing {
    match kind {
        TokenKind::LineComment => {
            if same_line {
                // Trailing comment: stays appended to the statement above it.
                spacing.spaces_required = 1;
                spacing.break_decision = BreakDecision::MustAppend;
            } else {
                // Standalone comment: forced onto its own line.
                spacing.spaces_required = 0;
                spacing.break_decision = BreakDecision::MustWrap;
            }
        }
        TokenKind::BlockComment => {
            if same_line {
                spacing.spaces_required = 1;
                spacing.break_decision = BreakDecision::Undecided;
            } else {
                spacing.spaces_required = 0;
                spacing.break_decision = BreakDecision::MustWrap;
            }
        }
        _ => unreachable!("comment_spacing called on a non-comment token"),
    }
    spacing
}

/// Hierarchical names (`a.b.c`) and array-slice/index brackets (`a[i]`) are
/// atomic token groups: joinable is always preferred, a split there carries
/// the heaviest penalty band (`spec.md` §4.1 "Break penalties").
fn is_atomic_join(prev: TokenKind, cur: TokenKind, _ctx: NonterminalKind) -> bool {
    matches!(
        (prev, cur),
        (TokenKind::Dot, _)
            | (_, TokenKind::Dot)
            | (TokenKind::Identifier, TokenKind::LBracket)
            | (TokenKind::LBracket, _)
            | (_, TokenKind::RBracket)
    )
}

/// Finds every port/parameter list with more than one item and returns the
/// token index of each item's first token (every one of them starts its own
/// line once the list as a whole expands — `spec.md` §4.3, scenario 1) plus
/// the token index of the list's closing `)` (dedents back to the header's
/// own indentation rather than trailing the last item). A single-item list
/// is left alone — it keeps the default single-line rendering unless
/// something else forces a wrap.
fn multi_item_list_breaks(cst: &Cst) -> (FxHashSet<u32>, FxHashSet<u32>) {
    let mut wrap_start = FxHashSet::default();
    let mut dedent = FxHashSet::default();
    collect_list_breaks(cst, cst.root, &mut wrap_start, &mut dedent);
    (wrap_start, dedent)
}

fn collect_list_breaks(cst: &Cst, id: CstId, wrap_start: &mut FxHashSet<u32>, dedent: &mut FxHashSet<u32>) {
    let node = cst.node(id);
    if matches!(node.kind, NonterminalKind::PortList | NonterminalKind::ParameterPortList) && node.children.len() > 1
    {
        for &child in &node.children {
            wrap_start.insert(cst.node(child).start_token);
        }
        if node.end_token > 0 {
            dedent.insert(node.end_token - 1);
        }
    }
    for &child in &node.children {
        collect_list_breaks(cst, child, wrap_start, dedent);
    }
}

/// Builds, for every token index, the innermost enclosing nonterminal —
/// computed by filling each node's own range first (least specific) and
/// then overwriting with its children's ranges (most specific wins).
fn enclosing_kinds(cst: &Cst, token_count: usize) -> Vec<NonterminalKind> {
    let mut kinds = vec![NonterminalKind::SourceFile; token_count];
    fill(cst, cst.root, &mut kinds);
    kinds
}

fn fill(cst: &Cst, id: CstId, kinds: &mut [NonterminalKind]) {
    let node = cst.node(id);
    let start = node.start_token as usize;
    let end = (node.end_token as usize).min(kinds.len());
    for slot in kinds.iter_mut().take(end).skip(start) {
        *slot = node.kind;
    }
    let children = node.children.clone();
    for child in children {
        fill(cst, child, kinds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::build_format_tokens;
    use sv_syntax::build_text_structure;

    #[test]
    fn comma_has_no_space_before_and_one_after() {
        let structure = build_text_structure("module m(input a,input b);endmodule\n").unwrap();
        let mut tokens = build_format_tokens(&structure.tokens);
        let style = FormatStyle::default();
        annotate(&mut tokens, &structure.cst, structure.source, &style);

        let comma_idx = tokens.iter().position(|t| t.kind() == TokenKind::Comma).unwrap();
        assert_eq!(tokens[comma_idx].before.spaces_required, 0);
        assert_eq!(tokens[comma_idx + 1].before.spaces_required, 1);
    }

    #[test]
    fn semicolon_forces_wrap_at_statement_scope() {
        let structure = build_text_structure("assign x = a;\nassign y = b;\n").unwrap();
        let mut tokens = build_format_tokens(&structure.tokens);
        let style = FormatStyle::default();
        annotate(&mut tokens, &structure.cst, structure.source, &style);

        let semi_idx = tokens.iter().position(|t| t.kind() == TokenKind::Semicolon).unwrap();
        assert_eq!(
            tokens[semi_idx + 1].before.break_decision,
            BreakDecision::MustWrap
        );
    }

    #[test]
    fn concatenation_braces_are_tight_when_style_disables_spacing() {
        let structure = build_text_structure("assign x = {a,b};\n").unwrap();
        let mut tokens = build_format_tokens(&structure.tokens);
        let style = FormatStyle {
            space_around_concatenation: false,
            ..FormatStyle::default()
        };
        annotate(&mut tokens, &structure.cst, structure.source, &style);

        let open = tokens.iter().position(|t| t.kind() == TokenKind::LBrace).unwrap();
        let close = tokens.iter().position(|t| t.kind() == TokenKind::RBrace).unwrap();
        assert_eq!(tokens[open + 1].before.spaces_required, 0);
        assert_eq!(tokens[close].before.spaces_required, 0);
    }

    #[test]
    fn trailing_line_comment_stays_attached() {
        let structure = build_text_structure("assign x = a; // note\nassign y = b;\n").unwrap();
        let mut tokens = build_format_tokens(&structure.tokens);
        let style = FormatStyle::default();
        annotate(&mut tokens, &structure.cst, structure.source, &style);

        let comment_idx = tokens.iter().position(|t| t.kind() == TokenKind::LineComment).unwrap();
        assert_eq!(
            tokens[comment_idx].before.break_decision,
            BreakDecision::MustAppend
        );
    }
}
