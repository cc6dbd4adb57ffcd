//! A hand-written lexer covering the practical SystemVerilog subset this
//! workspace formats. Whitespace is consumed silently (the formatter
//! recomputes all inter-token spacing); comments and preprocessor directives
//! are kept as tokens since they participate in disabled-range resolution
//! and must round-trip through the verifier.

use sv_text_size::{TextRange, TextSize};
use thiserror::Error;

use crate::token::{Token, TokenKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated string literal starting at byte {0:?}")]
    UnterminatedString(TextSize),
    #[error("unterminated block comment starting at byte {0:?}")]
    UnterminatedBlockComment(TextSize),
    #[error("unexpected character {1:?} at byte {0:?}")]
    UnexpectedChar(TextSize, char),
}

/// Lexes `source` into a flat token stream. `Eof` is always the final token
/// (zero-width, at `source.len()`) so downstream code can always look one
/// token ahead without special-casing the end of the file.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        while self.pos < self.bytes.len() {
            self.skip_whitespace();
            if self.pos >= self.bytes.len() {
                break;
            }
            self.scan_one()?;
        }
        self.push(TokenKind::Eof, self.pos, self.pos);
        Ok(self.tokens)
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                _ => break,
            }
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            range: TextRange::new(
                TextSize::try_from(start).unwrap(),
                TextSize::try_from(end).unwrap(),
            ),
        });
    }

    fn peek(&self) -> u8 {
        self.bytes.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn scan_one(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let c = self.peek() as char;

        if c == '/' && self.peek_at(1) == b'/' {
            return self.scan_line_comment(start);
        }
        if c == '/' && self.peek_at(1) == b'*' {
            return self.scan_block_comment(start);
        }
        if c == '`' {
            return self.scan_preprocessor(start);
        }
        if c == '"' {
            return self.scan_string(start);
        }
        if c == '$' {
            return self.scan_system_identifier(start);
        }
        if c.is_ascii_digit() {
            return self.scan_number(start);
        }
        if is_ident_start(c) {
            return self.scan_identifier_or_keyword(start);
        }

        self.scan_punctuation(start)
    }

    fn scan_line_comment(&mut self, start: usize) -> Result<(), LexError> {
        self.pos += 2;
        self.pos = memchr::memchr(b'\n', &self.bytes[self.pos..])
            .map_or(self.bytes.len(), |rel| self.pos + rel);
        self.push(TokenKind::LineComment, start, self.pos);
        Ok(())
    }

    fn scan_block_comment(&mut self, start: usize) -> Result<(), LexError> {
        self.pos += 2;
        loop {
            if self.pos + 1 >= self.bytes.len() {
                return Err(LexError::UnterminatedBlockComment(
                    TextSize::try_from(start).unwrap(),
                ));
            }
            if self.bytes[self.pos] == b'*' && self.bytes[self.pos + 1] == b'/' {
                self.pos += 2;
                break;
            }
            self.pos += 1;
        }
        self.push(TokenKind::BlockComment, start, self.pos);
        Ok(())
    }

    fn scan_preprocessor(&mut self, start: usize) -> Result<(), LexError> {
        self.pos += 1;
        while self.pos < self.bytes.len() && is_ident_continue(self.bytes[self.pos] as char) {
            self.pos += 1;
        }
        // A directive's argument list (e.g. `define FOO(x)`) runs to end of
        // line unless escaped; the engine only needs the directive keyword
        // as an atomic token, so the remainder is left for the main loop.
        self.push(TokenKind::Preprocessor, start, self.pos);
        Ok(())
    }

    fn scan_string(&mut self, start: usize) -> Result<(), LexError> {
        self.pos += 1;
        loop {
            if self.pos >= self.bytes.len() {
                return Err(LexError::UnterminatedString(
                    TextSize::try_from(start).unwrap(),
                ));
            }
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'"' => {
                    self.pos += 1;
                    break;
                }
                _ => self.pos += 1,
            }
        }
        self.push(TokenKind::StringLiteral, start, self.pos.min(self.bytes.len()));
        Ok(())
    }

    fn scan_system_identifier(&mut self, start: usize) -> Result<(), LexError> {
        self.pos += 1;
        while self.pos < self.bytes.len() && is_ident_continue(self.bytes[self.pos] as char) {
            self.pos += 1;
        }
        self.push(TokenKind::SystemIdentifier, start, self.pos);
        Ok(())
    }

    fn scan_number(&mut self, start: usize) -> Result<(), LexError> {
        // Decimal digits, an optional based-literal suffix (`'h`, `'b`, `'d`,
        // `'o`, with optional size prefix and `s`/`S` signedness), and
        // underscores as digit separators.
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_digit() || self.bytes[self.pos] == b'_')
        {
            self.pos += 1;
        }
        if self.peek() == b'\'' {
            self.pos += 1;
            if matches!(self.peek(), b's' | b'S') {
                self.pos += 1;
            }
            if matches!(self.peek(), b'h' | b'H' | b'b' | b'B' | b'd' | b'D' | b'o' | b'O') {
                self.pos += 1;
                while self.pos < self.bytes.len()
                    && (self.bytes[self.pos].is_ascii_alphanumeric() || self.bytes[self.pos] == b'_')
                {
                    self.pos += 1;
                }
            }
        } else if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            self.pos += 1;
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }
        self.push(TokenKind::Number, start, self.pos);
        Ok(())
    }

    fn scan_identifier_or_keyword(&mut self, start: usize) -> Result<(), LexError> {
        while self.pos < self.bytes.len() && is_ident_continue(self.bytes[self.pos] as char) {
            self.pos += 1;
        }
        let text = &self.source[start..self.pos];
        let kind = keyword_kind(text).unwrap_or(TokenKind::Identifier);
        self.push(kind, start, self.pos);
        Ok(())
    }

    fn scan_punctuation(&mut self, start: usize) -> Result<(), LexError> {
        // Longest-match-first over the multi-character operators this
        // subset needs; anything left over falls through to single-char
        // punctuation or a one-character `Operator`.
        const MULTI: &[&str] = &[
            "<<<", ">>>", "===", "!==", "==?", "!=?", "->", "<->", "**", "==", "!=", "<=", ">=",
            "&&", "||", "<<", ">>", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "::",
        ];
        for op in MULTI {
            if self.source[start..].starts_with(op) {
                self.pos = start + op.len();
                self.push(TokenKind::Operator, start, self.pos);
                return Ok(());
            }
        }

        let c = self.peek();
        self.pos += 1;
        let kind = match c {
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b';' => TokenKind::Semicolon,
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b'.' => TokenKind::Dot,
            b'#' => TokenKind::Hash,
            b'@' => TokenKind::At,
            b'?' => TokenKind::Question,
            b'=' => TokenKind::Assign,
            b'+' | b'-' | b'*' | b'/' | b'%' | b'<' | b'>' | b'&' | b'|' | b'^' | b'~' | b'!' => {
                TokenKind::Operator
            }
            other => {
                return Err(LexError::UnexpectedChar(
                    TextSize::try_from(start).unwrap(),
                    other as char,
                ))
            }
        };
        self.push(kind, start, self.pos);
        Ok(())
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn keyword_kind(text: &str) -> Option<TokenKind> {
    Some(match text {
        "module" => TokenKind::KwModule,
        "endmodule" => TokenKind::KwEndmodule,
        "package" => TokenKind::KwPackage,
        "endpackage" => TokenKind::KwEndpackage,
        "class" => TokenKind::KwClass,
        "endclass" => TokenKind::KwEndclass,
        "function" => TokenKind::KwFunction,
        "endfunction" => TokenKind::KwEndfunction,
        "task" => TokenKind::KwTask,
        "endtask" => TokenKind::KwEndtask,
        "input" => TokenKind::KwInput,
        "output" => TokenKind::KwOutput,
        "inout" => TokenKind::KwInout,
        "parameter" => TokenKind::KwParameter,
        "localparam" => TokenKind::KwLocalparam,
        "assign" => TokenKind::KwAssign,
        "always" => TokenKind::KwAlways,
        "always_comb" => TokenKind::KwAlwaysComb,
        "always_ff" => TokenKind::KwAlwaysFf,
        "always_latch" => TokenKind::KwAlwaysLatch,
        "initial" => TokenKind::KwInitial,
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "case" => TokenKind::KwCase,
        "casex" => TokenKind::KwCasex,
        "casez" => TokenKind::KwCasez,
        "endcase" => TokenKind::KwEndcase,
        "default" => TokenKind::KwDefault,
        "begin" => TokenKind::KwBegin,
        "end" => TokenKind::KwEnd,
        "generate" => TokenKind::KwGenerate,
        "endgenerate" => TokenKind::KwEndgenerate,
        "genvar" => TokenKind::KwGenvar,
        "for" => TokenKind::KwFor,
        "while" => TokenKind::KwWhile,
        "posedge" => TokenKind::KwPosedge,
        "negedge" => TokenKind::KwNegedge,
        "reg" => TokenKind::KwReg,
        "wire" => TokenKind::KwWire,
        "logic" => TokenKind::KwLogic,
        "return" => TokenKind::KwReturn,
        "bit" | "byte" | "int" | "integer" | "longint" | "shortint" | "real" | "time"
        | "typedef" | "struct" | "enum" | "union" | "interface" | "endinterface" | "modport"
        | "export" | "import" | "program" | "endprogram" | "automatic" | "static" | "const"
        | "signed" | "unsigned" | "ref" | "var" | "void" | "foreach" | "repeat" | "do"
        | "break" | "continue" | "fork" | "join" | "join_any" | "join_none" | "disable"
        | "unique" | "priority" | "forever" => TokenKind::KwOther,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_module_header() {
        let kinds = kinds("module m(input a,input b);endmodule\n");
        assert_eq!(
            kinds,
            vec![
                TokenKind::KwModule,
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::KwInput,
                TokenKind::Identifier,
                TokenKind::Comma,
                TokenKind::KwInput,
                TokenKind::Identifier,
                TokenKind::RParen,
                TokenKind::Semicolon,
                TokenKind::KwEndmodule,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_based_number_literal() {
        let tokens = lex("assign x = 8'hFF;").unwrap();
        let number = &tokens[3];
        assert_eq!(number.kind, TokenKind::Number);
        assert_eq!(number.text("assign x = 8'hFF;"), "8'hFF");
    }

    #[test]
    fn line_comment_runs_to_newline() {
        let tokens = lex("a; // trailing\nb;").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::LineComment);
        assert_eq!(tokens[1].text("a; // trailing\nb;"), "// trailing");
    }

    #[test]
    fn unterminated_block_comment_errors() {
        assert!(matches!(
            lex("/* never closed"),
            Err(LexError::UnterminatedBlockComment(_))
        ));
    }
}
