//! Statement parsing
//!
//! Grammar handled here:
//! ```text
//! compound  -> 'begin' statement { ';' statement } 'end'
//! statement -> assign | call | compound | if | for | while | 'exit' | <empty>
//! assign    -> id [ '[' expr {',' expr} ']' ] ':=' expr
//! call      -> id [ '(' [expr {',' expr}] ')' ]
//! if        -> 'if' expr 'then' statement [ 'else' statement ]
//! for       -> 'for' id ':=' expr ('to' | 'downto') expr 'do' statement
//! while     -> 'while' expr 'do' statement
//! ```
//!
//! Statement sequences are the main recovery point: a statement that fails
//! to parse is recorded and skipped up to the next `;`, `end` or token that
//! clearly starts a new statement.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, TokenKind};
use crate::parser::parse::{ParseResult, Parser};

impl Parser {
    /// `begin <sequence> end` for program and subprogram bodies. A missing
    /// `begin` or `end` is reported without dropping the statements.
    pub(crate) fn parse_block_statements(
        &mut self,
    ) -> Result<(Vec<Statement>, SourceLocation), LexError> {
        let location = self.current_location();
        if let Err(err) = self.expect(TokenKind::Begin, "Expected 'begin'") {
            self.record(err)?;
        }
        let statements = self.parse_statement_sequence()?;
        if let Err(err) = self.expect(TokenKind::End, "Expected 'end'") {
            self.record(err)?;
        }
        Ok((statements, location))
    }

    /// Statements up to (not including) `end` or end of file.
    pub(crate) fn parse_statement_sequence(
        &mut self,
    ) -> Result<Vec<Statement>, LexError> {
        let mut statements = Vec::new();

        loop {
            match self.peek_kind() {
                TokenKind::End | TokenKind::Eof => break,
                TokenKind::Semicolon => {
                    self.advance();
                    continue;
                }
                _ => {}
            }

            let start = self.position;
            match self.parse_statement() {
                Ok(statement) => {
                    statements.push(statement);
                    if self.match_token(TokenKind::Semicolon)
                        || self.check(TokenKind::End)
                        || self.is_at_end()
                    {
                        continue;
                    }
                    let err = self.error_at_current("Expected ';' after statement");
                    self.record(err)?;
                    if !self.starts_statement() {
                        self.synchronize_statement()?;
                    }
                }
                Err(err) => {
                    self.record(err)?;
                    self.synchronize_statement()?;
                    if self.position == start && !self.check(TokenKind::End) {
                        self.advance();
                    }
                }
            }
        }

        Ok(statements)
    }

    /// Skip to the next `;` (consumed), `end`, or statement start.
    fn synchronize_statement(&mut self) -> Result<(), LexError> {
        loop {
            self.synchronize(STATEMENT_SYNC)?;
            match self.peek_kind() {
                TokenKind::Semicolon => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::Ident if !self.starts_statement() => {
                    self.advance();
                }
                _ => return Ok(()),
            }
        }
    }

    /// Whether the current token clearly begins a statement. A bare
    /// identifier only counts when followed by `:=`, `[` or `(`.
    fn starts_statement(&self) -> bool {
        match self.peek_kind() {
            TokenKind::Begin
            | TokenKind::If
            | TokenKind::For
            | TokenKind::While
            | TokenKind::Exit => true,
            TokenKind::Ident => matches!(
                self.peek_ahead_kind(1),
                TokenKind::Assign | TokenKind::LBracket | TokenKind::LParen
            ),
            _ => false,
        }
    }

    pub(crate) fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.peek_kind() {
            TokenKind::Ident => self.parse_assign_or_call(),
            TokenKind::Begin => self.parse_compound_statement(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Exit => {
                let location = self.advance().location;
                Ok(Statement::Exit { location })
            }
            // Empty statement, e.g. `if c then else x := 1`
            TokenKind::Semicolon | TokenKind::End | TokenKind::Else => {
                Ok(Statement::Compound {
                    statements: Vec::new(),
                    location: self.current_location(),
                })
            }
            _ => Err(self.error_at_current("Expected statement")),
        }
    }

    pub(crate) fn parse_compound_statement(&mut self) -> ParseResult<Statement> {
        let location = self.current_location();
        self.expect(TokenKind::Begin, "Expected 'begin'")?;
        let statements = self.parse_statement_sequence()?;
        self.expect(TokenKind::End, "Expected 'end' to close 'begin'")?;
        Ok(Statement::Compound {
            statements,
            location,
        })
    }

    fn parse_assign_or_call(&mut self) -> ParseResult<Statement> {
        let (name, location) = self.expect_identifier("Expected identifier")?;

        match self.peek_kind() {
            TokenKind::LBracket => {
                let indices = self.parse_index_list()?;
                self.expect(TokenKind::Assign, "Expected ':=' in assignment")?;
                let value = self.parse_expression()?;
                Ok(Statement::Assign {
                    name,
                    indices,
                    value,
                    location,
                })
            }
            TokenKind::Assign => {
                self.advance();
                let value = self.parse_expression()?;
                Ok(Statement::Assign {
                    name,
                    indices: Vec::new(),
                    value,
                    location,
                })
            }
            TokenKind::LParen => {
                let args = self.parse_argument_list()?;
                Ok(Statement::Call {
                    name,
                    args,
                    location,
                })
            }
            TokenKind::Eq | TokenKind::Colon => {
                Err(self.error_at_current("Expected ':=' in assignment"))
            }
            _ => Ok(Statement::Call {
                name,
                args: Vec::new(),
                location,
            }),
        }
    }

    fn parse_if_statement(&mut self) -> ParseResult<Statement> {
        let location = self.advance().location;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Then, "Expected 'then' after condition")?;
        let then_branch = Box::new(self.parse_statement()?);

        let else_branch = if self.match_token(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
            location,
        })
    }

    fn parse_for_statement(&mut self) -> ParseResult<Statement> {
        let location = self.advance().location;
        let (variable, _) = self.expect_identifier("Expected loop variable")?;
        self.expect(TokenKind::Assign, "Expected ':=' after loop variable")?;
        let start = self.parse_expression()?;

        let direction = match self.peek_kind() {
            TokenKind::To => ForDirection::To,
            TokenKind::Downto => ForDirection::Downto,
            _ => return Err(self.error_at_current("Expected 'to' or 'downto'")),
        };
        self.advance();

        let end = self.parse_expression()?;
        self.expect(TokenKind::Do, "Expected 'do' after loop bounds")?;
        let body = Box::new(self.parse_statement()?);

        Ok(Statement::For {
            variable,
            start,
            end,
            direction,
            body,
            location,
        })
    }

    fn parse_while_statement(&mut self) -> ParseResult<Statement> {
        let location = self.advance().location;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Do, "Expected 'do' after condition")?;
        let body = Box::new(self.parse_statement()?);

        Ok(Statement::While {
            condition,
            body,
            location,
        })
    }
}

/// Tokens at which a failed statement stops being skipped.
const STATEMENT_SYNC: &[TokenKind] = &[
    TokenKind::Semicolon,
    TokenKind::End,
    TokenKind::Begin,
    TokenKind::If,
    TokenKind::For,
    TokenKind::While,
    TokenKind::Exit,
    TokenKind::Ident,
];
