//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, panic-mode recovery and the main
//! parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: program head, constants, variables, subprograms
//! - `statements`: statement sequences and the individual statements
//! - `expressions`: precedence climbing over a prefix-parser table
//!
//! # Error recovery
//!
//! Inner parse functions return [`ParseResult`] and give up on the first
//! mismatch. Statement sequences and declaration sections catch that
//! failure, record it as a [`SyntaxError`], skip ahead to a token from a
//! context-specific synchronization set and keep going. A lexical error
//! token is never skipped: it aborts the whole parse with a [`LexError`].

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Literal, Token, TokenKind};
use log::debug;
use thiserror::Error;

/// Recoverable syntax error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Syntax error at line {}, column {}: {message}",
    .location.line,
    .location.column
)]
pub struct SyntaxError {
    pub message: String,
    pub location: SourceLocation,
}

impl SyntaxError {
    pub fn location(&self) -> SourceLocation {
        self.location
    }
}

/// Why an inner parse function gave up
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParseError {
    Syntax(SyntaxError),
    Lexical(LexError),
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::Lexical(err)
    }
}

pub(crate) type ParseResult<T> = Result<T, ParseError>;

/// A finished parse: the (possibly partial) tree and every recorded error
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub program: Program,
    pub errors: Vec<SyntaxError>,
}

/// Parse a token stream into a [`Program`].
///
/// Only a lexical error token aborts; syntax errors are collected in
/// [`ParseOutput::errors`].
pub fn parse(
    tokens: impl IntoIterator<Item = Token>,
) -> Result<ParseOutput, LexError> {
    Parser::new(tokens).parse_program()
}

/// Recursive descent parser for the Pascal subset
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) errors: Vec<SyntaxError>,
}

impl Parser {
    pub fn new(tokens: impl IntoIterator<Item = Token>) -> Self {
        let mut tokens: Vec<Token> = tokens.into_iter().collect();
        let terminated = tokens
            .last()
            .is_some_and(|t| matches!(t.kind, TokenKind::Eof | TokenKind::Error));
        if !terminated {
            let location = tokens
                .last()
                .map(|t| t.location)
                .unwrap_or(SourceLocation::new(1, 1));
            tokens.push(Token::new(TokenKind::Eof, location, ""));
        }

        Self {
            tokens,
            position: 0,
            errors: Vec::new(),
        }
    }

    /// Lex and wrap a source string.
    pub fn from_source(source: &str) -> Self {
        Self::new(Lexer::new(source).tokenize())
    }

    /// Parse `program_head ; program_body .`
    pub fn parse_program(mut self) -> Result<ParseOutput, LexError> {
        let head = match self.parse_program_head() {
            Ok(head) => head,
            Err(err) => {
                let location = self.current_location();
                self.record(err)?;
                self.synchronize(&[
                    TokenKind::Semicolon,
                    TokenKind::Const,
                    TokenKind::Var,
                    TokenKind::Procedure,
                    TokenKind::Function,
                    TokenKind::Begin,
                ])?;
                self.match_token(TokenKind::Semicolon);
                ProgramHead {
                    name: String::new(),
                    parameters: Vec::new(),
                    location,
                }
            }
        };

        let body = self.parse_program_body()?;

        if let Err(err) =
            self.expect(TokenKind::Dot, "Expected '.' after program body")
        {
            self.record(err)?;
        } else if !self.is_at_end() {
            let err = self.error_at_current("Expected end of file after '.'");
            self.record(err)?;
        }

        debug!(
            "parsed program '{}' with {} syntax error(s)",
            head.name,
            self.errors.len()
        );

        Ok(ParseOutput {
            program: Program { head, body },
            errors: self.errors,
        })
    }

    // ===== Recovery =====

    /// Record a recoverable error, or pass a lexical one through.
    pub(crate) fn record(&mut self, err: ParseError) -> Result<(), LexError> {
        match err {
            ParseError::Syntax(err) => {
                debug!("syntax error at {}: {}", err.location, err.message);
                self.errors.push(err);
                Ok(())
            }
            ParseError::Lexical(err) => Err(err),
        }
    }

    /// Skip tokens until one of `stop` (or end of file) is next.
    pub(crate) fn synchronize(
        &mut self,
        stop: &[TokenKind],
    ) -> Result<(), LexError> {
        loop {
            let kind = self.peek_kind();
            if kind == TokenKind::Error {
                return Err(LexError::from_token(self.peek()));
            }
            if kind == TokenKind::Eof || stop.contains(&kind) {
                break;
            }
            self.advance();
        }
        debug!("resynchronized at {}", self.current_location());
        Ok(())
    }

    /// Build an error at the current token. An error token there turns
    /// into the fatal lexical error instead.
    pub(crate) fn error_at_current(&self, message: &str) -> ParseError {
        let token = self.peek();
        if token.kind == TokenKind::Error {
            return ParseError::Lexical(LexError::from_token(token));
        }
        ParseError::Syntax(SyntaxError {
            message: format!("{}, found {}", message, token),
            location: token.location,
        })
    }

    pub(crate) fn error_at(
        &self,
        location: SourceLocation,
        message: String,
    ) -> ParseError {
        ParseError::Syntax(SyntaxError { message, location })
    }

    // ===== Helper methods =====

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() && token.kind != TokenKind::Error {
            self.position += 1;
        }
        token
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    /// Current token. Reading past the end keeps yielding the sentinel.
    pub(crate) fn peek(&self) -> &Token {
        let index = self.position.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub(crate) fn peek_ahead_kind(&self, n: usize) -> TokenKind {
        let index = (self.position + n).min(self.tokens.len() - 1);
        self.tokens[index].kind
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    pub(crate) fn expect(
        &mut self,
        kind: TokenKind,
        message: &str,
    ) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(message))
        }
    }

    /// Consume an identifier, returning its lowercased name and location.
    pub(crate) fn expect_identifier(
        &mut self,
        message: &str,
    ) -> ParseResult<(String, SourceLocation)> {
        if !self.check(TokenKind::Ident) {
            return Err(self.error_at_current(message));
        }
        let token = self.advance();
        let name = match token.literal {
            Some(Literal::Str(name)) => name,
            _ => token.text.to_ascii_lowercase(),
        };
        Ok((name, token.location))
    }

    /// `id {',' id}`
    pub(crate) fn parse_identifier_list(
        &mut self,
        message: &str,
    ) -> ParseResult<Vec<String>> {
        let mut names = vec![self.expect_identifier(message)?.0];
        while self.match_token(TokenKind::Comma) {
            names.push(self.expect_identifier("Expected identifier after ','")?.0);
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_source(source: &str) -> ParseOutput {
        Parser::from_source(source)
            .parse_program()
            .expect("no lexical error")
    }

    #[test]
    fn test_parse_simple_program() {
        let output = parse_source(
            "program Simple; var x, y: integer; begin x := 2 + 3; y := x - 1; end.",
        );

        assert!(output.errors.is_empty(), "{:?}", output.errors);
        assert_eq!(output.program.head.name, "simple");
        assert_eq!(output.program.body.vars.len(), 1);
        assert_eq!(output.program.body.vars[0].names, vec!["x", "y"]);
        assert_eq!(output.program.body.statements.len(), 2);
    }

    #[test]
    fn test_program_parameters_are_accepted() {
        let output =
            parse_source("program p(input, output); begin end.");
        assert!(output.errors.is_empty());
        assert_eq!(output.program.head.parameters, vec!["input", "output"]);
    }

    #[test]
    fn test_missing_final_dot() {
        let output = parse_source("program p; begin end");
        assert_eq!(output.errors.len(), 1);
        assert!(output.errors[0].message.contains("Expected '.'"));
    }

    #[test]
    fn test_trailing_tokens_after_dot() {
        let output = parse_source("program p; begin end. x");
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].location, SourceLocation::new(1, 23));
    }

    #[test]
    fn test_lexical_error_aborts() {
        let result = Parser::from_source("program p; begin x := 1 # 2 end.")
            .parse_program();
        let err = result.unwrap_err();
        assert_eq!(err.location, SourceLocation::new(1, 25));
    }

    #[test]
    fn test_reading_past_end_yields_eof() {
        let mut parser = Parser::new(Vec::new());
        assert!(parser.is_at_end());
        parser.advance();
        parser.advance();
        assert_eq!(parser.peek_kind(), TokenKind::Eof);
        assert_eq!(parser.peek_ahead_kind(10), TokenKind::Eof);
    }

    #[test]
    fn test_error_message_names_found_token() {
        let output = parse_source("program p; begin x := ; end.");
        assert_eq!(output.errors.len(), 1);
        assert_eq!(
            output.errors[0].message,
            "Expected expression, found ';'"
        );
        assert_eq!(output.errors[0].location, SourceLocation::new(1, 23));
    }
}
