//! Out-of-core lexer and minimal concrete-syntax builder.
//!
//! `spec.md` names the lexer/parser an external collaborator that the
//! formatting core merely consumes from (an ordered token stream, a CST with
//! nonterminal tags, a line-column map). This crate is that collaborator: it
//! exists so the workspace is runnable end-to-end in tests and via the CLI,
//! not as a goal of the formatting engine itself.

pub mod cst;
pub mod lexer;
pub mod token;

use sv_text_size::LineIndex;
use thiserror::Error;

pub use cst::{Cst, CstId, CstNode, NonterminalKind, ParseError};
pub use lexer::{lex, LexError};
pub use token::{Token, TokenKind};

/// Everything the formatting core needs about one source file: the original
/// bytes, the flat token stream, the concrete syntax tree, and the
/// line-column map (`spec.md` §6's `text_structure`).
#[derive(Debug, Clone)]
pub struct TextStructure<'a> {
    pub source: &'a str,
    pub tokens: Vec<Token>,
    pub cst: Cst,
    pub line_index: LineIndex,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Lexes and parses `source`, producing the [`TextStructure`] the formatting
/// core consumes. This is the one seam where the core's convenience
/// entry point (`sv_formatter::format_source`) touches this crate.
pub fn build_text_structure(source: &str) -> Result<TextStructure<'_>, BuildError> {
    let tokens = lex(source)?;
    let cst = cst::parse(&tokens)?;
    Ok(TextStructure {
        source,
        tokens,
        cst,
        line_index: LineIndex::from_source(source),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_text_structure_for_trivial_module() {
        let structure = build_text_structure("module m;endmodule\n").unwrap();
        assert!(!structure.tokens.is_empty());
        assert_eq!(
            structure.cst.node(structure.cst.root).kind,
            NonterminalKind::SourceFile
        );
    }
}
