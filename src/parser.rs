use std::iter::Peekable;
use std::str::Chars;

use crate::error::{InterpError, Result};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    LBrace,
    RBrace,
    Symbol(String),
    Integer(i64),
    String(String),
}

const SYMBOL_CHARS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_+-*/\\=<>!:?";

fn is_symbol_char(c: char) -> bool {
    SYMBOL_CHARS.contains(c)
}

/// Lexes `input` into a flat token stream (§6.1 lexical grammar). Comments
/// (`;` to end of line) are discarded here rather than kept as tokens.
fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars: Peekable<Chars> = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            '{' => {
                tokens.push(Token::LBrace);
                chars.next();
            }
            '}' => {
                tokens.push(Token::RBrace);
                chars.next();
            }
            ';' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('n') => s.push('\n'),
                            Some('t') => s.push('\t'),
                            Some('\\') => s.push('\\'),
                            Some('"') => s.push('"'),
                            Some(other) => {
                                return Err(InterpError::Parse(format!(
                                    "invalid escape sequence \\{other}"
                                )));
                            }
                            None => {
                                return Err(InterpError::Parse(
                                    "unterminated string literal".to_string(),
                                ));
                            }
                        },
                        Some(other) => s.push(other),
                        None => {
                            return Err(InterpError::Parse(
                                "unterminated string literal".to_string(),
                            ));
                        }
                    }
                }
                tokens.push(Token::String(s));
            }
            c if c.is_ascii_digit()
                || (c == '-' && matches!(peek_nth(&chars, 1), Some(d) if d.is_ascii_digit())) =>
            {
                let mut buf = String::new();
                if c == '-' {
                    buf.push(c);
                    chars.next();
                }
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        buf.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let n = buf
                    .parse::<i64>()
                    .map_err(|_| InterpError::Parse(format!("invalid integer literal {buf}")))?;
                tokens.push(Token::Integer(n));
            }
            c if is_symbol_char(c) => {
                let mut buf = String::new();
                while let Some(&d) = chars.peek() {
                    if is_symbol_char(d) {
                        buf.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Symbol(buf));
            }
            other => {
                return Err(InterpError::Parse(format!("unexpected character '{other}'")));
            }
        }
    }

    Ok(tokens)
}

fn peek_nth(chars: &Peekable<Chars>, n: usize) -> Option<char> {
    chars.clone().nth(n)
}

struct TokenStream<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenStream<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        self.pos += 1;
        t
    }
}

fn parse_expr(stream: &mut TokenStream) -> Result<Value> {
    match stream.next() {
        Some(Token::LParen) => parse_seq(stream, Token::RParen).map(Value::SExpr),
        Some(Token::LBrace) => parse_seq(stream, Token::RBrace).map(Value::QExpr),
        Some(Token::RParen) => Err(InterpError::Parse("unexpected ')'".to_string())),
        Some(Token::RBrace) => Err(InterpError::Parse("unexpected '}'".to_string())),
        Some(Token::Symbol(s)) => Ok(Value::Symbol(s.clone())),
        Some(Token::Integer(n)) => Ok(Value::Integer(*n)),
        Some(Token::String(s)) => Ok(Value::String(s.clone())),
        None => Err(InterpError::Parse("unexpected end of input".to_string())),
    }
}

fn parse_seq(stream: &mut TokenStream, close: Token) -> Result<Vec<Value>> {
    let mut items = Vec::new();
    loop {
        match stream.peek() {
            Some(t) if *t == close => {
                stream.next();
                return Ok(items);
            }
            Some(_) => items.push(parse_expr(stream)?),
            None => {
                let expected = match close {
                    Token::RParen => "'('",
                    Token::RBrace => "'{'",
                    _ => "expression",
                };
                return Err(InterpError::Parse(format!("unmatched {expected}")));
            }
        }
    }
}

/// Parses `input` into a single top-level `Value` (§6.1). Zero or more
/// top-level expressions are wrapped in one SExpr; for single-line REPL
/// input this SExpr *is* the parse result, matching the driver's
/// `eval(parse(line))` entry point.
pub fn parse(input: &str) -> Result<Value> {
    let tokens = tokenize(input)?;
    let mut stream = TokenStream { tokens: &tokens, pos: 0 };
    let mut top = Vec::new();
    while stream.peek().is_some() {
        top.push(parse_expr(&mut stream)?);
    }
    Ok(Value::SExpr(top))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integers_and_negative_integers() {
        match parse("42").unwrap() {
            Value::SExpr(top) => assert!(matches!(top[0], Value::Integer(42))),
            _ => panic!("expected SExpr"),
        }
        match parse("-7").unwrap() {
            Value::SExpr(top) => assert!(matches!(top[0], Value::Integer(-7))),
            _ => panic!("expected SExpr"),
        }
    }

    #[test]
    fn parses_sexpr_and_qexpr() {
        let v = parse("(+ 1 2)").unwrap();
        match v {
            Value::SExpr(top) => match &top[0] {
                Value::SExpr(inner) => assert_eq!(inner.len(), 3),
                _ => panic!("expected inner SExpr"),
            },
            _ => panic!("expected top SExpr"),
        }

        let v = parse("{1 2 3}").unwrap();
        match v {
            Value::SExpr(top) => match &top[0] {
                Value::QExpr(inner) => assert_eq!(inner.len(), 3),
                _ => panic!("expected QExpr"),
            },
            _ => panic!("expected top SExpr"),
        }
    }

    #[test]
    fn parses_strings_with_escapes() {
        let v = parse("\"a\\nb\"").unwrap();
        match v {
            Value::SExpr(top) => assert!(matches!(&top[0], Value::String(s) if s == "a\nb")),
            _ => panic!("expected SExpr"),
        }
    }

    #[test]
    fn skips_comments() {
        let v = parse("; a comment\n1 ; trailing\n2").unwrap();
        match v {
            Value::SExpr(top) => assert_eq!(top.len(), 2),
            _ => panic!("expected SExpr"),
        }
    }

    #[test]
    fn reports_unmatched_parens() {
        assert!(parse("(+ 1 2").is_err());
        assert!(parse("1 2)").is_err());
    }

    #[test]
    fn symbol_grammar_accepts_reserved_operator_names() {
        let v = parse("=? != <= >= : \\").unwrap();
        match v {
            Value::SExpr(top) => assert_eq!(top.len(), 6),
            _ => panic!("expected SExpr"),
        }
    }
}
