//! Verifier — re-lexes the formatted text and checks it carries exactly
//! the same token stream as the input, refusing to emit anything that
//! would lose or corrupt source content (`spec.md` §4.6).

use sv_syntax::{lex, Token, TokenKind};

use crate::error::FormatError;

/// Compares the original token stream against a re-lex of `formatted`.
/// Two streams are equivalent when they have the same length and each
/// pair of tokens agrees on kind and text; whitespace is irrelevant since
/// the lexer never emits it as a token.
pub fn verify(original_source: &str, original: &[Token], formatted: &str) -> Result<(), FormatError> {
    let relexed = lex(formatted).map_err(|err| FormatError::DataLoss {
        detail: format!("formatted output failed to re-lex: {err}"),
    })?;

    let original = non_eof(original, original_source);
    let relexed = non_eof(&relexed, formatted);

    if original.len() != relexed.len() {
        return Err(FormatError::DataLoss {
            detail: format!(
                "token count changed: {} before, {} after",
                original.len(),
                relexed.len()
            ),
        });
    }

    for (i, (before, after)) in original.iter().zip(relexed.iter()).enumerate() {
        if before != after {
            return Err(FormatError::DataLoss {
                detail: format!("token {i} changed: {before:?} -> {after:?}"),
            });
        }
    }

    Ok(())
}

fn non_eof<'a>(tokens: &[Token], source: &'a str) -> Vec<(TokenKind, &'a str)> {
    tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| (t.kind, t.text(source)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_syntax::lex;

    #[test]
    fn identical_token_stream_passes() {
        let source = "module m;assign x=a;endmodule\n";
        let formatted = "module m;\n  assign x = a;\nendmodule\n";
        let tokens = lex(source).unwrap();
        assert!(verify(source, &tokens, formatted).is_ok());
    }

    #[test]
    fn dropped_token_fails() {
        let source = "module m;assign x=a;endmodule\n";
        let formatted = "module m;\n  assign x = ;\nendmodule\n";
        let tokens = lex(source).unwrap();
        assert!(verify(source, &tokens, formatted).is_err());
    }
}
