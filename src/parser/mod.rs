//! Recursive-descent parser for the Installer S-expression syntax.
//!
//! ```text
//! expr := atom | '(' head args ')'
//! head := OP_KEYWORD | OPT_KEYWORD | SYM
//! args := expr*
//! ```
//!
//! The parser resolves heads through the [`OpCode`] / [`OptTag`] keyword
//! tables: a known operator becomes a Native node, a known option keyword
//! becomes an Option node, anything else becomes a user-procedure call.
//! Two forms get special shaping to match the node model:
//!
//! * `(set a 1 b 2)` stores the names `a`, `b` as Symbol nodes in the
//!   operator's `symbols` sequence, values as `children`.
//! * `(procedure NAME p1 p2 body...)` produces a Custom node whose
//!   `symbols` are the formals; the leading run of bare symbols is the
//!   parameter list, the rest is the body.

mod lexer;

pub use lexer::{Token, TokenKind, tokenize, unquote};

use thiserror::Error;

use crate::ast::{NodeId, OpCode, OptTag, Tree};

/// Errors reported while turning source text into a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: unexpected ')'")]
    UnexpectedClose { line: u32 },
    #[error("line {line}: expected '(' or atom, found '{found}'")]
    UnexpectedToken { line: u32, found: String },
    #[error("line {line}: expected a symbol, found '{found}'")]
    ExpectedSymbol { line: u32, found: String },
    #[error("line {line}: unreadable token '{found}'")]
    BadToken { line: u32, found: String },
    #[error("unexpected end of input")]
    UnexpectedEof,
}

/// Parse a whole script into a Context-rooted tree.
///
/// Returns the arena and the root node; `Evaluator::run` takes both.
pub fn parse(source: &str) -> Result<(Tree, NodeId), ParseError> {
    let tokens = tokenize(source);
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        tree: Tree::new(),
    };
    let root = parser.tree.contxt(1);
    while !parser.at_end() {
        let stmt = parser.parse_expr()?;
        parser.tree.push(root, stmt);
    }
    Ok((parser.tree, root))
}

struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    tree: Tree,
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<&Token<'a>, ParseError> {
        let tok = self.tokens.get(self.pos).ok_or(ParseError::UnexpectedEof)?;
        self.pos += 1;
        Ok(tok)
    }

    fn parse_expr(&mut self) -> Result<NodeId, ParseError> {
        let tok = self.next()?.clone();
        match tok.kind {
            TokenKind::Int => Ok(self.tree.number(parse_int(tok.text, 10), tok.line)),
            TokenKind::Hex => {
                let digits = tok.text.trim_start_matches('$');
                let digits = digits
                    .strip_prefix("0x")
                    .or_else(|| digits.strip_prefix("0X"))
                    .unwrap_or(digits);
                Ok(self.tree.number(parse_int(digits, 16), tok.line))
            }
            TokenKind::Bin => {
                let digits = tok.text.trim_start_matches('%');
                let digits = digits
                    .strip_prefix("0b")
                    .or_else(|| digits.strip_prefix("0B"))
                    .unwrap_or(digits);
                Ok(self.tree.number(parse_int(digits, 2), tok.line))
            }
            TokenKind::Str => {
                let text = unquote(tok.text);
                Ok(self.tree.string(&text, tok.line))
            }
            TokenKind::Sym => Ok(self.tree.symref(tok.text, tok.line)),
            TokenKind::LParen => self.parse_form(tok.line),
            TokenKind::RParen => Err(ParseError::UnexpectedClose { line: tok.line }),
            TokenKind::Error => Err(ParseError::BadToken {
                line: tok.line,
                found: tok.text.to_string(),
            }),
        }
    }

    /// Parse a parenthesized form; the `(` is already consumed.
    fn parse_form(&mut self, line: u32) -> Result<NodeId, ParseError> {
        let head = self.next()?.clone();
        if head.kind != TokenKind::Sym {
            return Err(ParseError::ExpectedSymbol {
                line: head.line,
                found: head.text.to_string(),
            });
        }

        if let Some(op) = OpCode::from_name(head.text) {
            return match op {
                OpCode::Set => self.parse_set(op, line),
                OpCode::Procedure => self.parse_procedure(line),
                OpCode::OnError => self.parse_onerror(line),
                _ => {
                    let node = self.tree.native(op, line);
                    self.parse_args(node)
                }
            };
        }

        if let Some(tag) = OptTag::from_name(head.text) {
            let node = self.tree.option(tag, line);
            return self.parse_args(node);
        }

        let node = self.tree.cusref(head.text, line);
        self.parse_args(node)
    }

    /// Generic argument list: expressions until the closing paren.
    fn parse_args(&mut self, node: NodeId) -> Result<NodeId, ParseError> {
        loop {
            match self.peek() {
                Some(tok) if tok.kind == TokenKind::RParen => {
                    self.pos += 1;
                    return Ok(node);
                }
                Some(_) => {
                    let child = self.parse_expr()?;
                    self.tree.push(node, child);
                }
                None => return Err(ParseError::UnexpectedEof),
            }
        }
    }

    /// `(set name value name value ...)`: names into `symbols`, values
    /// into `children`, pairwise.
    fn parse_set(&mut self, op: OpCode, line: u32) -> Result<NodeId, ParseError> {
        let node = self.tree.native(op, line);
        loop {
            let tok = self.next()?.clone();
            match tok.kind {
                TokenKind::RParen => return Ok(node),
                TokenKind::Sym => {
                    let sym = self.tree.symbol(tok.text, tok.line);
                    self.tree.append_symbol(node, sym);
                    let value = self.parse_expr()?;
                    self.tree.push(node, value);
                }
                _ => {
                    return Err(ParseError::ExpectedSymbol {
                        line: tok.line,
                        found: tok.text.to_string(),
                    });
                }
            }
        }
    }

    /// `(procedure NAME p1 p2 ... body...)`: a Native wrapping one
    /// Custom; leading bare symbols become the formal parameters.
    fn parse_procedure(&mut self, line: u32) -> Result<NodeId, ParseError> {
        let native = self.tree.native(OpCode::Procedure, line);
        let name = self.next()?.clone();
        if name.kind != TokenKind::Sym {
            return Err(ParseError::ExpectedSymbol {
                line: name.line,
                found: name.text.to_string(),
            });
        }
        let custom = self.tree.custom(name.text, name.line);

        // Formals: the run of bare symbols before the first real
        // statement.
        while let Some(tok) = self.peek() {
            if tok.kind != TokenKind::Sym {
                break;
            }
            let (text, tok_line) = (tok.text, tok.line);
            let formal = self.tree.symbol(text, tok_line);
            self.tree.append_symbol(custom, formal);
            self.pos += 1;
        }

        // Body statements.
        loop {
            match self.peek() {
                Some(tok) if tok.kind == TokenKind::RParen => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {
                    let stmt = self.parse_expr()?;
                    self.tree.push(custom, stmt);
                }
                None => return Err(ParseError::UnexpectedEof),
            }
        }

        self.tree.push(native, custom);
        Ok(native)
    }

    /// `(onerror body...)`: sugar for defining the `@onerror` handler
    /// procedure.
    fn parse_onerror(&mut self, line: u32) -> Result<NodeId, ParseError> {
        let native = self.tree.native(OpCode::OnError, line);
        let custom = self.tree.custom("@onerror", line);
        loop {
            match self.peek() {
                Some(tok) if tok.kind == TokenKind::RParen => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {
                    let stmt = self.parse_expr()?;
                    self.tree.push(custom, stmt);
                }
                None => return Err(ParseError::UnexpectedEof),
            }
        }
        self.tree.push(native, custom);
        Ok(native)
    }
}

fn parse_int(digits: &str, radix: u32) -> i32 {
    i64::from_str_radix(digits, radix).map_or(0, |v| v as i32)
}
