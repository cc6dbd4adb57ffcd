//! A minimal concrete syntax tree.
//!
//! Real SystemVerilog parsers (the ones `spec.md` treats as an external
//! collaborator) resolve the full IEEE 1800 grammar. This one recognizes
//! just the constructs the tree-unwrapper's construct table (SPEC_FULL §4.3)
//! needs to pick a partition policy: module/package/class bodies, port and
//! parameter lists, continuous assignments, procedural blocks, `if`/`else`,
//! `case`, `function`/`task` declarations, and module instantiations.
//! Anything else collapses to a [`NonterminalKind::Leaf`] run of tokens up
//! to its terminating `;` (or matching `end*`), which the unwrapper treats
//! as a single `FitOnLineElseExpand` item — total coverage without total
//! grammar fidelity.

use sv_index::{declare_index, IndexVec};
use thiserror::Error;

use crate::token::{Token, TokenKind};

declare_index!(pub struct CstId);

/// The syntactic category of one [`CstNode`]. Closed set, matched
/// exhaustively wherever policy depends on it (design note: tagged unions,
/// not an open class hierarchy).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NonterminalKind {
    SourceFile,
    ModuleDeclaration,
    ModuleHeader,
    ParameterPortList,
    PortList,
    PortDeclaration,
    ContinuousAssign,
    ProceduralBlock,
    StatementBlock,
    IfStatement,
    ElseClause,
    CaseStatement,
    CaseItem,
    FunctionDeclaration,
    FunctionHeader,
    TaskDeclaration,
    ModuleInstantiation,
    PortConnectionList,
    PortConnection,
    /// An unrecognized run of tokens up to its terminator; see module docs.
    Leaf,
}

/// One node of the tree: a nonterminal tag, a contiguous span of token
/// indices (half-open, excluding the synthetic EOF token), and child ids.
/// Parent pointers are not stored on the node itself — callers that need
/// upward traversal carry a parent-index stack, per the "Cyclic/parent
/// references" design note.
#[derive(Clone, Debug)]
pub struct CstNode {
    pub kind: NonterminalKind,
    pub start_token: u32,
    pub end_token: u32,
    pub children: Vec<CstId>,
}

impl CstNode {
    pub fn token_range(&self) -> std::ops::Range<u32> {
        self.start_token..self.end_token
    }
}

#[derive(Debug, Clone)]
pub struct Cst {
    pub nodes: IndexVec<CstId, CstNode>,
    pub root: CstId,
}

impl Cst {
    pub fn node(&self, id: CstId) -> &CstNode {
        &self.nodes[id]
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of file while parsing {0}")]
    UnexpectedEof(&'static str),
    #[error("expected {expected}, found {found:?} at token {at}")]
    Expected {
        expected: &'static str,
        found: TokenKind,
        at: usize,
    },
}

pub fn parse(tokens: &[Token]) -> Result<Cst, ParseError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        nodes: IndexVec::new(),
    };
    let root = parser.parse_source_file()?;
    Ok(Cst {
        nodes: parser.nodes,
        root,
    })
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    nodes: IndexVec<CstId, CstNode>,
}

impl<'a> Parser<'a> {
    fn kind(&self) -> TokenKind {
        self.tokens.get(self.pos).map_or(TokenKind::Eof, |t| t.kind)
    }

    fn kind_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn at_eof(&self) -> bool {
        self.kind() == TokenKind::Eof
    }

    fn bump(&mut self) -> usize {
        let at = self.pos;
        if self.pos < self.tokens.len() && self.tokens[self.pos].kind != TokenKind::Eof {
            self.pos += 1;
        }
        at
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.kind() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn make(&mut self, kind: NonterminalKind, start: u32, children: Vec<CstId>) -> CstId {
        let end = self.pos as u32;
        self.nodes.push(CstNode {
            kind,
            start_token: start,
            end_token: end,
            children,
        })
    }

    /// Consumes tokens up to and including `terminator`, tracking nested
    /// paren/bracket/brace depth so a `;` inside a `for (;;)` header doesn't
    /// end the leaf early. Used as the catch-all for constructs this parser
    /// doesn't model in detail.
    fn leaf_until(&mut self, kind: NonterminalKind, terminator: TokenKind) -> CstId {
        let start = self.pos as u32;
        let mut depth = 0i32;
        loop {
            match self.kind() {
                TokenKind::Eof => break,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth -= 1;
                    self.bump();
                }
                k if k == terminator && depth <= 0 => {
                    self.bump();
                    break;
                }
                _ => {
                    self.bump();
                }
            }
        }
        self.make(kind, start, Vec::new())
    }

    fn parse_source_file(&mut self) -> Result<CstId, ParseError> {
        let start = 0u32;
        let mut children = Vec::new();
        while !self.at_eof() {
            match self.kind() {
                TokenKind::KwModule => children.push(self.parse_module_declaration()?),
                _ => children.push(self.leaf_until(NonterminalKind::Leaf, TokenKind::Semicolon)),
            }
        }
        Ok(self.make(NonterminalKind::SourceFile, start, children))
    }

    fn parse_module_declaration(&mut self) -> Result<CstId, ParseError> {
        let start = self.pos as u32;
        let header = self.parse_module_header()?;
        let mut children = vec![header];
        while !matches!(self.kind(), TokenKind::KwEndmodule | TokenKind::Eof) {
            children.push(self.parse_module_item()?);
        }
        if !self.eat(TokenKind::KwEndmodule) {
            return Err(ParseError::UnexpectedEof("module declaration"));
        }
        Ok(self.make(NonterminalKind::ModuleDeclaration, start, children))
    }

    fn parse_module_header(&mut self) -> Result<CstId, ParseError> {
        let start = self.pos as u32;
        let mut children = Vec::new();
        if !self.eat(TokenKind::KwModule) {
            return Err(ParseError::Expected {
                expected: "module",
                found: self.kind(),
                at: self.pos,
            });
        }
        self.eat(TokenKind::Identifier);
        if self.eat(TokenKind::Hash) {
            children.push(self.parse_paren_list(NonterminalKind::ParameterPortList)?);
        }
        if self.kind() == TokenKind::LParen {
            children.push(self.parse_paren_list(NonterminalKind::PortList)?);
        }
        self.eat(TokenKind::Semicolon);
        Ok(self.make(NonterminalKind::ModuleHeader, start, children))
    }

    /// Parses a parenthesized, comma-separated list as used by port lists
    /// and parameter port lists: each comma-delimited item becomes one
    /// [`NonterminalKind::PortDeclaration`] leaf.
    fn parse_paren_list(&mut self, kind: NonterminalKind) -> Result<CstId, ParseError> {
        let start = self.pos as u32;
        if !self.eat(TokenKind::LParen) {
            return Err(ParseError::Expected {
                expected: "(",
                found: self.kind(),
                at: self.pos,
            });
        }
        let mut children = Vec::new();
        while !matches!(self.kind(), TokenKind::RParen | TokenKind::Eof) {
            let item_start = self.pos as u32;
            let mut depth = 0i32;
            loop {
                match self.kind() {
                    TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                        depth += 1;
                        self.bump();
                    }
                    TokenKind::RParen if depth == 0 => break,
                    TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                        depth -= 1;
                        self.bump();
                    }
                    TokenKind::Comma if depth == 0 => break,
                    TokenKind::Eof => break,
                    _ => {
                        self.bump();
                    }
                }
            }
            children.push(self.make(NonterminalKind::PortDeclaration, item_start, Vec::new()));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if !self.eat(TokenKind::RParen) {
            return Err(ParseError::Expected {
                expected: ")",
                found: self.kind(),
                at: self.pos,
            });
        }
        Ok(self.make(kind, start, children))
    }

    fn parse_module_item(&mut self) -> Result<CstId, ParseError> {
        match self.kind() {
            TokenKind::KwAssign => self.parse_continuous_assign(),
            TokenKind::KwAlways
            | TokenKind::KwAlwaysComb
            | TokenKind::KwAlwaysFf
            | TokenKind::KwAlwaysLatch
            | TokenKind::KwInitial => self.parse_procedural_block(),
            TokenKind::KwFunction => self.parse_function_declaration(),
            TokenKind::KwTask => self.parse_task_declaration(),
            TokenKind::Identifier
                if self.kind_at(1) == TokenKind::Identifier
                    && (self.kind_at(2) == TokenKind::LParen
                        || self.kind_at(2) == TokenKind::Hash) =>
            {
                self.parse_module_instantiation()
            }
            _ => Ok(self.leaf_until(NonterminalKind::Leaf, TokenKind::Semicolon)),
        }
    }

    fn parse_continuous_assign(&mut self) -> Result<CstId, ParseError> {
        Ok(self.leaf_until(NonterminalKind::ContinuousAssign, TokenKind::Semicolon))
    }

    fn parse_procedural_block(&mut self) -> Result<CstId, ParseError> {
        let start = self.pos as u32;
        self.bump(); // always/always_comb/always_ff/always_latch/initial
        if self.eat(TokenKind::At) {
            // Event control: `@(posedge clk)` or `@*`.
            if self.eat(TokenKind::LParen) {
                let mut depth = 1i32;
                while depth > 0 && !self.at_eof() {
                    match self.kind() {
                        TokenKind::LParen => depth += 1,
                        TokenKind::RParen => depth -= 1,
                        _ => {}
                    }
                    self.bump();
                }
            } else {
                self.bump();
            }
        }
        let body = self.parse_statement()?;
        Ok(self.make(NonterminalKind::ProceduralBlock, start, vec![body]))
    }

    fn parse_statement(&mut self) -> Result<CstId, ParseError> {
        match self.kind() {
            TokenKind::KwBegin => self.parse_statement_block(),
            TokenKind::KwIf => self.parse_if_statement(),
            TokenKind::KwCase | TokenKind::KwCasex | TokenKind::KwCasez => {
                self.parse_case_statement()
            }
            _ => Ok(self.leaf_until(NonterminalKind::Leaf, TokenKind::Semicolon)),
        }
    }

    fn parse_statement_block(&mut self) -> Result<CstId, ParseError> {
        let start = self.pos as u32;
        self.bump(); // begin
        let mut children = Vec::new();
        while !matches!(self.kind(), TokenKind::KwEnd | TokenKind::Eof) {
            children.push(self.parse_statement()?);
        }
        self.eat(TokenKind::KwEnd);
        Ok(self.make(NonterminalKind::StatementBlock, start, children))
    }

    fn parse_if_statement(&mut self) -> Result<CstId, ParseError> {
        let start = self.pos as u32;
        self.bump(); // if
        if self.eat(TokenKind::LParen) {
            let mut depth = 1i32;
            while depth > 0 && !self.at_eof() {
                match self.kind() {
                    TokenKind::LParen => depth += 1,
                    TokenKind::RParen => depth -= 1,
                    _ => {}
                }
                self.bump();
            }
        }
        let mut children = vec![self.parse_statement()?];
        if self.kind() == TokenKind::KwElse {
            let else_start = self.pos as u32;
            self.bump();
            let else_body = if self.kind() == TokenKind::KwIf {
                self.parse_if_statement()?
            } else {
                self.parse_statement()?
            };
            children.push(self.make(NonterminalKind::ElseClause, else_start, vec![else_body]));
        }
        Ok(self.make(NonterminalKind::IfStatement, start, children))
    }

    fn parse_case_statement(&mut self) -> Result<CstId, ParseError> {
        let start = self.pos as u32;
        self.bump(); // case/casex/casez
        if self.eat(TokenKind::LParen) {
            let mut depth = 1i32;
            while depth > 0 && !self.at_eof() {
                match self.kind() {
                    TokenKind::LParen => depth += 1,
                    TokenKind::RParen => depth -= 1,
                    _ => {}
                }
                self.bump();
            }
        }
        let mut children = Vec::new();
        while !matches!(self.kind(), TokenKind::KwEndcase | TokenKind::Eof) {
            let item_start = self.pos as u32;
            // Case-item label: an expression list (or `default`) up to `:`.
            while !matches!(self.kind(), TokenKind::Colon | TokenKind::Eof) {
                self.bump();
            }
            self.eat(TokenKind::Colon);
            let body = self.parse_statement()?;
            children.push(self.make(NonterminalKind::CaseItem, item_start, vec![body]));
        }
        self.eat(TokenKind::KwEndcase);
        Ok(self.make(NonterminalKind::CaseStatement, start, children))
    }

    fn parse_function_declaration(&mut self) -> Result<CstId, ParseError> {
        let start = self.pos as u32;
        self.bump(); // function
        while self.kind() != TokenKind::Semicolon && !self.at_eof() {
            self.bump();
        }
        self.eat(TokenKind::Semicolon);
        let header = self.make(NonterminalKind::FunctionHeader, start, Vec::new());
        let mut children = vec![header];
        while !matches!(self.kind(), TokenKind::KwEndfunction | TokenKind::Eof) {
            children.push(self.parse_statement()?);
        }
        self.eat(TokenKind::KwEndfunction);
        Ok(self.make(NonterminalKind::FunctionDeclaration, start, children))
    }

    fn parse_task_declaration(&mut self) -> Result<CstId, ParseError> {
        let start = self.pos as u32;
        self.bump(); // task
        while self.kind() != TokenKind::Semicolon && !self.at_eof() {
            self.bump();
        }
        self.eat(TokenKind::Semicolon);
        let header = self.make(NonterminalKind::FunctionHeader, start, Vec::new());
        let mut children = vec![header];
        while !matches!(self.kind(), TokenKind::KwEndtask | TokenKind::Eof) {
            children.push(self.parse_statement()?);
        }
        self.eat(TokenKind::KwEndtask);
        Ok(self.make(NonterminalKind::TaskDeclaration, start, children))
    }

    fn parse_module_instantiation(&mut self) -> Result<CstId, ParseError> {
        let start = self.pos as u32;
        self.bump(); // module type name
        if self.eat(TokenKind::Hash) {
            self.parse_paren_list(NonterminalKind::ParameterPortList)?;
        }
        self.bump(); // instance name
        let mut children = Vec::new();
        if self.kind() == TokenKind::LParen {
            children.push(self.parse_connection_list()?);
        }
        self.eat(TokenKind::Semicolon);
        Ok(self.make(NonterminalKind::ModuleInstantiation, start, children))
    }

    fn parse_connection_list(&mut self) -> Result<CstId, ParseError> {
        let start = self.pos as u32;
        self.eat(TokenKind::LParen);
        let mut children = Vec::new();
        while !matches!(self.kind(), TokenKind::RParen | TokenKind::Eof) {
            let item_start = self.pos as u32;
            let mut depth = 0i32;
            loop {
                match self.kind() {
                    TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                        depth += 1;
                        self.bump();
                    }
                    TokenKind::RParen if depth == 0 => break,
                    TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                        depth -= 1;
                        self.bump();
                    }
                    TokenKind::Comma if depth == 0 => break,
                    TokenKind::Eof => break,
                    _ => {
                        self.bump();
                    }
                }
            }
            children.push(self.make(NonterminalKind::PortConnection, item_start, Vec::new()));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.eat(TokenKind::RParen);
        Ok(self.make(NonterminalKind::PortConnectionList, start, children))
    }
}
