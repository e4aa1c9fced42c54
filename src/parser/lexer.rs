//! Logos-based lexer for Installer script source.
//!
//! Fast tokenization using the logos crate. Comments start with `;` and
//! run to end of line. Anything that is not a parenthesis, a string, or a
//! number is a symbol: that includes the operator names `+`, `<=`, `<>`
//! and friends, which the parser resolves through the keyword tables.

use logos::Logos;

/// A token with its kind, raw text, and source line (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub line: u32,
}

/// Token kind as the parser sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    Str,
    Int,
    Hex,
    Bin,
    Sym,
    /// Anything logos rejects; surfaced as a parse error.
    Error,
}

/// Logos token enum: maps to TokenKind.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r";[^\n]*")]
enum RawToken {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    /// Double-quoted string with backslash escapes.
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,

    /// Decimal integer. Longest-match keeps `127th` a symbol.
    #[regex(r"-?[0-9]+", priority = 5)]
    Int,

    /// `$ff` or `0xff`.
    #[regex(r"\$[0-9a-fA-F]+|0[xX][0-9a-fA-F]+", priority = 6)]
    Hex,

    /// `%1010` or `0b1010`.
    #[regex(r"%[01]+|0[bB][01]+", priority = 6)]
    Bin,

    /// Symbols: operator keywords, option keywords, identifiers.
    #[regex(r#"[^()"; \t\r\n]+"#, priority = 2)]
    Sym,
}

impl From<RawToken> for TokenKind {
    fn from(raw: RawToken) -> TokenKind {
        match raw {
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::Str => TokenKind::Str,
            RawToken::Int => TokenKind::Int,
            RawToken::Hex => TokenKind::Hex,
            RawToken::Bin => TokenKind::Bin,
            RawToken::Sym => TokenKind::Sym,
        }
    }
}

/// Tokenize a whole source text, attaching line numbers.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    // Offsets of line starts, for offset → line translation.
    let mut line_starts = vec![0usize];
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            line_starts.push(i + 1);
        }
    }
    let line_of = |offset: usize| -> u32 {
        match line_starts.binary_search(&offset) {
            Ok(i) => i as u32 + 1,
            Err(i) => i as u32,
        }
    };

    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        tokens.push(Token {
            kind: result.map(TokenKind::from).unwrap_or(TokenKind::Error),
            text: lexer.slice(),
            line: line_of(span.start),
        });
    }
    tokens
}

/// Decode a quoted string literal: strip the quotes, apply escapes.
///
/// Recognized escapes: `\n`, `\t`, `\r`, `\"`, `\\`, `\e` (ESC). An
/// unknown escape yields the escaped character unchanged.
pub fn unquote(text: &str) -> String {
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('e') => out.push('\x1b'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds(r#"(set x 5)"#),
            vec![
                TokenKind::LParen,
                TokenKind::Sym,
                TokenKind::Sym,
                TokenKind::Int,
                TokenKind::RParen
            ]
        );
    }

    #[test]
    fn test_number_bases() {
        assert_eq!(
            kinds("$ff 0x10 %101 0b11 -7"),
            vec![
                TokenKind::Hex,
                TokenKind::Hex,
                TokenKind::Bin,
                TokenKind::Bin,
                TokenKind::Int,
            ]
        );
    }

    #[test]
    fn test_comment_skipped() {
        assert_eq!(
            kinds("; a comment\n(debug) ; trailing"),
            vec![TokenKind::LParen, TokenKind::Sym, TokenKind::RParen]
        );
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(kinds("<= <> ="), vec![TokenKind::Sym; 3]);
    }

    #[test]
    fn test_line_numbers() {
        let toks = tokenize("(a)\n(b)\n\n(c)");
        let lines: Vec<u32> = toks.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 1, 1, 2, 2, 2, 4, 4, 4]);
    }

    #[test]
    fn test_unquote_escapes() {
        assert_eq!(unquote(r#""a\nb""#), "a\nb");
        assert_eq!(unquote(r#""say \"hi\"""#), "say \"hi\"");
        assert_eq!(unquote(r#""esc \e[2p""#), "esc \x1b[2p");
        assert_eq!(unquote(r#""plain""#), "plain");
    }
}
