//! # Search Query Parser
//!
//! Recursive descent over the token stream.
//!
//! ```text
//! query   := or
//! or      := and ("OR" and)*
//! and     := unary ("AND" unary)*
//! unary   := WORD ":" operand
//!          | "(" or ")"
//!          | WORD | QUOTED            (only inside a field scope)
//! operand := WORD | QUOTED | "(" or ")"
//! ```
//!
//! `AND` binds tighter than `OR`. Runs of the same operator flatten into a
//! single node. Groups nest at most [`MAX_DEPTH`] deep. Bare values outside
//! a `field:` scope are rejected here so that every compiled term has a
//! field to match against.

use super::ast::QueryNode;
use super::errors::{ParseError, ParseErrorKind};
use super::lexer::{tokenize, Token, TokenKind};

/// Deepest allowed parenthesis nesting
pub const MAX_DEPTH: usize = 64;

/// Parse a search string.
///
/// Returns `Ok(None)` for empty or whitespace-only input, meaning "no filter".
pub fn parse(text: &str) -> Result<Option<QueryNode>, ParseError> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: text.len(),
        depth: 0,
    };

    let node = parser.parse_or(false)?;

    if let Some(token) = parser.peek() {
        let kind = match &token.kind {
            TokenKind::RParen => ParseErrorKind::UnexpectedClosingParenthesis,
            TokenKind::Word(_) | TokenKind::Quoted(_) | TokenKind::LParen => {
                ParseErrorKind::MissingOperator(token.kind.describe())
            }
            other => ParseErrorKind::UnexpectedToken(other.describe()),
        };
        return Err(ParseError::new(kind, token.offset));
    }

    Ok(Some(node))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self, scoped: bool) -> Result<QueryNode, ParseError> {
        let mut children = vec![self.parse_and(scoped)?];

        while self.peek_kind() == Some(&TokenKind::Or) {
            self.next();
            children.push(self.parse_and(scoped)?);
        }

        Ok(QueryNode::or(children))
    }

    fn parse_and(&mut self, scoped: bool) -> Result<QueryNode, ParseError> {
        let mut children = vec![self.parse_unary(scoped)?];

        while self.peek_kind() == Some(&TokenKind::And) {
            self.next();
            children.push(self.parse_unary(scoped)?);
        }

        Ok(QueryNode::and(children))
    }

    fn parse_unary(&mut self, scoped: bool) -> Result<QueryNode, ParseError> {
        let token = self
            .next()
            .ok_or_else(|| ParseError::new(ParseErrorKind::UnexpectedEnd, self.end))?;

        match token.kind {
            TokenKind::Word(word) => {
                if self.peek_kind() == Some(&TokenKind::Colon) {
                    self.next();
                    let expr = self.parse_operand()?;
                    Ok(QueryNode::field(word, expr))
                } else if scoped {
                    Ok(QueryNode::term(word))
                } else {
                    Err(ParseError::new(
                        ParseErrorKind::UnscopedTerm(word),
                        token.offset,
                    ))
                }
            }
            TokenKind::Quoted(text) => {
                if scoped {
                    Ok(QueryNode::term(text))
                } else {
                    Err(ParseError::new(
                        ParseErrorKind::UnscopedTerm(text),
                        token.offset,
                    ))
                }
            }
            TokenKind::LParen => self.parse_group(scoped, token.offset),
            TokenKind::RParen => Err(ParseError::new(
                ParseErrorKind::UnexpectedClosingParenthesis,
                token.offset,
            )),
            other => Err(ParseError::new(
                ParseErrorKind::UnexpectedToken(other.describe()),
                token.offset,
            )),
        }
    }

    /// Right-hand side of `field:`
    fn parse_operand(&mut self) -> Result<QueryNode, ParseError> {
        let token = self
            .next()
            .ok_or_else(|| ParseError::new(ParseErrorKind::UnexpectedEnd, self.end))?;

        match token.kind {
            TokenKind::Word(value) | TokenKind::Quoted(value) => Ok(QueryNode::term(value)),
            TokenKind::LParen => self.parse_group(true, token.offset),
            other => Err(ParseError::new(
                ParseErrorKind::UnexpectedToken(other.describe()),
                token.offset,
            )),
        }
    }

    /// Body of a parenthesized group, after the opening `(`
    fn parse_group(&mut self, scoped: bool, opened_at: usize) -> Result<QueryNode, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::new(
                ParseErrorKind::NestingTooDeep(MAX_DEPTH),
                opened_at,
            ));
        }
        self.depth += 1;
        let result = self.parse_group_body(scoped, opened_at);
        self.depth -= 1;
        result
    }

    fn parse_group_body(&mut self, scoped: bool, opened_at: usize) -> Result<QueryNode, ParseError> {
        if self.peek_kind() == Some(&TokenKind::RParen) {
            let offset = self.peek().map(|t| t.offset).unwrap_or(self.end);
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken(")".to_string()),
                offset,
            ));
        }

        let inner = self.parse_or(scoped)?;

        match self.next() {
            Some(Token {
                kind: TokenKind::RParen,
                ..
            }) => Ok(QueryNode::group(inner)),
            Some(token) => {
                let kind = match &token.kind {
                    TokenKind::Word(_) | TokenKind::Quoted(_) | TokenKind::LParen => {
                        ParseErrorKind::MissingOperator(token.kind.describe())
                    }
                    other => ParseErrorKind::UnexpectedToken(other.describe()),
                };
                Err(ParseError::new(kind, token.offset))
            }
            None => Err(ParseError::new(
                ParseErrorKind::UnbalancedParenthesis,
                opened_at,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(text: &str) -> QueryNode {
        parse(text).unwrap().unwrap()
    }

    fn error_kind(text: &str) -> ParseErrorKind {
        parse(text).unwrap_err().kind
    }

    #[test]
    fn test_empty_is_no_filter() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   \t ").unwrap(), None);
    }

    #[test]
    fn test_field_term() {
        assert_eq!(
            parsed("event:new-image"),
            QueryNode::field("event", QueryNode::term("new-image"))
        );
    }

    #[test]
    fn test_field_quoted() {
        assert_eq!(
            parsed("event:'service-update'"),
            QueryNode::field("event", QueryNode::term("service-update"))
        );
    }

    #[test]
    fn test_field_group() {
        assert_eq!(
            parsed("event:(new-image OR \"update service plz\")"),
            QueryNode::field(
                "event",
                QueryNode::group(QueryNode::or(vec![
                    QueryNode::term("new-image"),
                    QueryNode::term("update service plz"),
                ]))
            )
        );
    }

    #[test]
    fn test_and_flattens() {
        let node = parsed("a:1 AND b:2 and c:3");
        match node {
            QueryNode::And { children } => assert_eq!(children.len(), 3),
            other => panic!("expected And, got {:?}", other),
        }
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        assert_eq!(
            parsed("event:new-image AND status:done OR event:update-service"),
            QueryNode::or(vec![
                QueryNode::and(vec![
                    QueryNode::field("event", QueryNode::term("new-image")),
                    QueryNode::field("status", QueryNode::term("done")),
                ]),
                QueryNode::field("event", QueryNode::term("update-service")),
            ])
        );
    }

    #[test]
    fn test_top_level_group() {
        assert_eq!(
            parsed("(a:1 OR b:2) AND c:3"),
            QueryNode::and(vec![
                QueryNode::group(QueryNode::or(vec![
                    QueryNode::field("a", QueryNode::term("1")),
                    QueryNode::field("b", QueryNode::term("2")),
                ])),
                QueryNode::field("c", QueryNode::term("3")),
            ])
        );
    }

    #[test]
    fn test_nested_field_override() {
        assert_eq!(
            parsed("f1:(x AND f2:y)"),
            QueryNode::field(
                "f1",
                QueryNode::group(QueryNode::and(vec![
                    QueryNode::term("x"),
                    QueryNode::field("f2", QueryNode::term("y")),
                ]))
            )
        );
    }

    #[test]
    fn test_nesting_limit() {
        let err = parse(&"(".repeat(100_000)).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NestingTooDeep(MAX_DEPTH));
        assert_eq!(err.position, MAX_DEPTH);

        let deepest = format!("{}a:1{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert!(parse(&deepest).is_ok());

        let too_deep = format!("{}a:1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert_eq!(error_kind(&too_deep), ParseErrorKind::NestingTooDeep(MAX_DEPTH));
    }

    #[test]
    fn test_unbalanced_parenthesis() {
        let err = parse("event:(a OR b").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnbalancedParenthesis);
        assert_eq!(err.position, 6);
    }

    #[test]
    fn test_stray_closing_parenthesis() {
        assert_eq!(
            error_kind("event:a)"),
            ParseErrorKind::UnexpectedClosingParenthesis
        );
    }

    #[test]
    fn test_missing_operator() {
        assert_eq!(
            error_kind("event:a status:b"),
            ParseErrorKind::MissingOperator("status".to_string())
        );
        assert_eq!(
            error_kind("event:(a b)"),
            ParseErrorKind::MissingOperator("b".to_string())
        );
    }

    #[test]
    fn test_unscoped_term_rejected() {
        assert_eq!(
            error_kind("new-image"),
            ParseErrorKind::UnscopedTerm("new-image".to_string())
        );
        assert_eq!(
            error_kind("(a OR b)"),
            ParseErrorKind::UnscopedTerm("a".to_string())
        );
    }

    #[test]
    fn test_dangling_operator() {
        assert_eq!(error_kind("event:a AND"), ParseErrorKind::UnexpectedEnd);
        assert_eq!(
            error_kind("OR event:a"),
            ParseErrorKind::UnexpectedToken("OR".to_string())
        );
    }

    #[test]
    fn test_empty_group_and_field() {
        assert_eq!(
            error_kind("event:()"),
            ParseErrorKind::UnexpectedToken(")".to_string())
        );
        assert_eq!(error_kind("event:"), ParseErrorKind::UnexpectedEnd);
    }
}
