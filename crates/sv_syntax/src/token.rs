//! Lexical token kinds.
//!
//! This is intentionally a practical subset of IEEE 1800 lexical categories —
//! enough to drive every formatting rule the engine implements, not a
//! standards-complete lexer.

use sv_text_size::TextRange;

/// The terminal kind of one lexed token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TokenKind {
    Identifier,
    /// A system task/function name, e.g. `$display`.
    SystemIdentifier,
    Number,
    StringLiteral,

    // Keywords that matter to the formatter's construct table. Kept flat
    // (not a nested `Keyword(KeywordKind)`) so `match` arms in the annotator
    // stay one level deep.
    KwModule,
    KwEndmodule,
    KwPackage,
    KwEndpackage,
    KwClass,
    KwEndclass,
    KwFunction,
    KwEndfunction,
    KwTask,
    KwEndtask,
    KwInput,
    KwOutput,
    KwInout,
    KwParameter,
    KwLocalparam,
    KwAssign,
    KwAlways,
    KwAlwaysComb,
    KwAlwaysFf,
    KwAlwaysLatch,
    KwInitial,
    KwIf,
    KwElse,
    KwCase,
    KwCasex,
    KwCasez,
    KwEndcase,
    KwDefault,
    KwBegin,
    KwEnd,
    KwGenerate,
    KwEndgenerate,
    KwGenvar,
    KwFor,
    KwWhile,
    KwPosedge,
    KwNegedge,
    KwReg,
    KwWire,
    KwLogic,
    KwReturn,
    /// Any other reserved word not individually distinguished above; still
    /// spaced like a keyword by the annotator's default table.
    KwOther,

    // Punctuation / operators.
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Semicolon,
    Comma,
    Colon,
    Dot,
    Hash,
    At,
    Assign,
    /// `+ - * / % ** == != < > <= >= && || & | ^ ~ ! << >> etc.`
    Operator,
    Question,

    /// Preprocessor directive, e.g. `` `define ``, `` `ifdef ``.
    Preprocessor,

    LineComment,
    BlockComment,

    Eof,
}

impl TokenKind {
    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::KwModule
                | TokenKind::KwEndmodule
                | TokenKind::KwPackage
                | TokenKind::KwEndpackage
                | TokenKind::KwClass
                | TokenKind::KwEndclass
                | TokenKind::KwFunction
                | TokenKind::KwEndfunction
                | TokenKind::KwTask
                | TokenKind::KwEndtask
                | TokenKind::KwInput
                | TokenKind::KwOutput
                | TokenKind::KwInout
                | TokenKind::KwParameter
                | TokenKind::KwLocalparam
                | TokenKind::KwAssign
                | TokenKind::KwAlways
                | TokenKind::KwAlwaysComb
                | TokenKind::KwAlwaysFf
                | TokenKind::KwAlwaysLatch
                | TokenKind::KwInitial
                | TokenKind::KwIf
                | TokenKind::KwElse
                | TokenKind::KwCase
                | TokenKind::KwCasex
                | TokenKind::KwCasez
                | TokenKind::KwEndcase
                | TokenKind::KwDefault
                | TokenKind::KwBegin
                | TokenKind::KwEnd
                | TokenKind::KwGenerate
                | TokenKind::KwEndgenerate
                | TokenKind::KwGenvar
                | TokenKind::KwFor
                | TokenKind::KwWhile
                | TokenKind::KwPosedge
                | TokenKind::KwNegedge
                | TokenKind::KwReg
                | TokenKind::KwWire
                | TokenKind::KwLogic
                | TokenKind::KwReturn
                | TokenKind::KwOther
        )
    }
}

/// One lexed token: its kind, its byte range, and (for convenience in tests
/// and diagnostics) the text it covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range]
    }
}

impl sv_text_size::Ranged for Token {
    fn range(&self) -> TextRange {
        self.range
    }
}
