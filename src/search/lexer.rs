//! Tokenizer for search query strings

use super::errors::{ParseError, ParseErrorKind};

/// Token kinds produced by the lexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    Colon,
    And,
    Or,
    /// Unquoted word
    Word(String),
    /// Quoted text with the quotes removed
    Quoted(String),
}

impl TokenKind {
    /// Source-like rendering for error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
            TokenKind::Colon => ":".to_string(),
            TokenKind::And => "AND".to_string(),
            TokenKind::Or => "OR".to_string(),
            TokenKind::Word(w) => w.clone(),
            TokenKind::Quoted(q) => format!("\"{}\"", q),
        }
    }
}

/// A token and the byte offset where it starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Splits a query string into tokens.
///
/// Words run until whitespace, a parenthesis or a colon. A backslash keeps
/// the next character literal. `AND` / `OR` are recognized in any case when
/// they appear as a whole unquoted word.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token {
                    kind: TokenKind::LParen,
                    offset,
                });
            }
            ')' => {
                chars.next();
                tokens.push(Token {
                    kind: TokenKind::RParen,
                    offset,
                });
            }
            ':' => {
                chars.next();
                tokens.push(Token {
                    kind: TokenKind::Colon,
                    offset,
                });
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut text = String::new();
                let mut closed = false;

                while let Some((_, c)) = chars.next() {
                    match c {
                        '\\' => {
                            if let Some((_, escaped)) = chars.next() {
                                text.push(escaped);
                            }
                        }
                        c if c == quote => {
                            closed = true;
                            break;
                        }
                        c => text.push(c),
                    }
                }

                if !closed {
                    return Err(ParseError::new(ParseErrorKind::UnterminatedQuote, offset));
                }

                tokens.push(Token {
                    kind: TokenKind::Quoted(text),
                    offset,
                });
            }
            _ => {
                let mut word = String::new();

                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | ':') {
                        break;
                    }
                    chars.next();
                    if c == '\\' {
                        if let Some((_, escaped)) = chars.next() {
                            word.push(escaped);
                        }
                    } else {
                        word.push(c);
                    }
                }

                let kind = if word.eq_ignore_ascii_case("and") {
                    TokenKind::And
                } else if word.eq_ignore_ascii_case("or") {
                    TokenKind::Or
                } else {
                    TokenKind::Word(word)
                };

                tokens.push(Token { kind, offset });
            }
        }
    }

    Ok(tokens)
}
