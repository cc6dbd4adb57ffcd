//! The format-token: a lexer token decorated with spacing/break metadata
//! (`spec.md` §3 "Format-token").

use sv_syntax::{Token, TokenKind};

/// An index into the format-token sequence for one format invocation. A
/// plain `u32` rather than an `sv_index` arena handle: format-tokens are
/// addressed by contiguous ranges (unwrapped lines), not by arbitrary
/// parent/child/previous links, so the dedicated newtype-index machinery
/// the partition tree and search states need would just add noise here.
pub type FormatTokenIndex = u32;

/// How the token preceding `cur` may be broken from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// No decision made yet; the search may append or wrap.
    Undecided,
    /// The search must keep this token on the same line as its predecessor.
    MustAppend,
    /// The search must start a new line before this token.
    MustWrap,
    /// This token's leading whitespace is copied verbatim from the source;
    /// the search does not touch it (`spec.md` §9 Open Question 2: this
    /// always wins over a simultaneous `MustWrap`).
    PreserveOriginal,
    /// Like `MustWrap`, but the new line starts back at the enclosing
    /// unwrapped line's own indentation rather than one `wrap_spaces` level
    /// deeper — the closing delimiter of a port/parameter list that wrapped
    /// (`spec.md` §4.3's port/parameter list row, scenario 1).
    MustWrapDedent,
}

/// The mutable spacing record attached to each token's leading edge
/// (`spec.md` §3 "before" record).
#[derive(Debug, Clone, Copy)]
pub struct BeforeSpacing {
    pub spaces_required: u32,
    pub break_decision: BreakDecision,
    pub break_penalty: u32,
}

impl Default for BeforeSpacing {
    fn default() -> Self {
        Self {
            spaces_required: 1,
            break_decision: BreakDecision::Undecided,
            break_penalty: 0,
        }
    }
}

/// A lexer token plus its spacing record. Immutable except for `before`,
/// which the annotator populates once and the search then reads only.
#[derive(Debug, Clone)]
pub struct FormatToken {
    pub token: Token,
    pub before: BeforeSpacing,
}

impl FormatToken {
    pub fn new(token: Token) -> Self {
        Self {
            token,
            before: BeforeSpacing::default(),
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.token.kind
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.token.text(source)
    }

    pub fn width(&self, source: &str) -> u32 {
        unicode_width::UnicodeWidthStr::width(self.text(source))
            .try_into()
            .unwrap_or(0)
    }
}

/// Builds the format-token sequence for a lexed token stream, skipping the
/// synthetic EOF marker (the partition tree never needs to address it — a
/// line's range always ends at the real last token).
pub fn build_format_tokens(tokens: &[Token]) -> Vec<FormatToken> {
    tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .cloned()
        .map(FormatToken::new)
        .collect()
}
