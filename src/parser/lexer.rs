//! Lexer (tokenizer) for Pascal source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the
//! parser. Keywords are case-insensitive and identifiers are folded to
//! lowercase. A malformed character sequence does not abort tokenizing;
//! it produces a single [`TokenKind::Error`] token that ends the stream and
//! which the parser turns into a fatal [`LexError`].

use crate::parser::ast::SourceLocation;
use std::fmt;
use thiserror::Error;

/// Fixed message table indexed by the payload of an error token.
pub const LEX_ERROR_MESSAGES: [&str; 4] = [
    "unexpected character",
    "unterminated string literal",
    "unterminated comment",
    "malformed number",
];

const UNEXPECTED_CHARACTER: usize = 0;
const UNTERMINATED_STRING: usize = 1;
const UNTERMINATED_COMMENT: usize = 2;
const MALFORMED_NUMBER: usize = 3;

/// Token kinds. Payloads live in [`Token::literal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Program,
    Const,
    Var,
    Procedure,
    Function,
    Begin,
    End,
    If,
    Then,
    Else,
    For,
    To,
    Downto,
    Do,
    While,
    Exit,
    Array,
    Of,
    Integer,
    Real,
    Boolean,
    Char,
    Not,
    And,
    Or,
    Div,
    Mod,
    True,
    False,

    // Identifiers and literals
    Ident,
    IntLiteral,
    RealLiteral,
    StringLiteral,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Assign,

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    DotDot,
    Comma,
    Colon,
    Semicolon,

    // Special
    Error,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Program => "'program'",
            TokenKind::Const => "'const'",
            TokenKind::Var => "'var'",
            TokenKind::Procedure => "'procedure'",
            TokenKind::Function => "'function'",
            TokenKind::Begin => "'begin'",
            TokenKind::End => "'end'",
            TokenKind::If => "'if'",
            TokenKind::Then => "'then'",
            TokenKind::Else => "'else'",
            TokenKind::For => "'for'",
            TokenKind::To => "'to'",
            TokenKind::Downto => "'downto'",
            TokenKind::Do => "'do'",
            TokenKind::While => "'while'",
            TokenKind::Exit => "'exit'",
            TokenKind::Array => "'array'",
            TokenKind::Of => "'of'",
            TokenKind::Integer => "'integer'",
            TokenKind::Real => "'real'",
            TokenKind::Boolean => "'boolean'",
            TokenKind::Char => "'char'",
            TokenKind::Not => "'not'",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Div => "'div'",
            TokenKind::Mod => "'mod'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Ident => "identifier",
            TokenKind::IntLiteral => "integer literal",
            TokenKind::RealLiteral => "real literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Eq => "'='",
            TokenKind::NotEq => "'<>'",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Assign => "':='",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Dot => "'.'",
            TokenKind::DotDot => "'..'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Error => "invalid input",
            TokenKind::Eof => "end of file",
        };
        write!(f, "{}", text)
    }
}

/// Literal payload attached to a token
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Real(f64),
    Str(String),
    /// Index into [`LEX_ERROR_MESSAGES`]
    Error(usize),
}

/// A single token: kind, optional payload, position and raw spelling
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: Option<Literal>,
    pub location: SourceLocation,
    pub text: String,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        location: SourceLocation,
        text: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            literal: None,
            location,
            text: text.into(),
        }
    }

    pub fn with_literal(mut self, literal: Literal) -> Self {
        self.literal = Some(literal);
        self
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Ident => write!(f, "identifier '{}'", self.text),
            TokenKind::IntLiteral | TokenKind::RealLiteral => {
                write!(f, "number '{}'", self.text)
            }
            TokenKind::StringLiteral => write!(f, "string {}", self.text),
            kind => write!(f, "{}", kind),
        }
    }
}

/// Fatal lexer error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Lexical error at line {}, column {}: {message}",
    .location.line,
    .location.column
)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

impl LexError {
    /// Rebuild the error carried by an error token.
    pub fn from_token(token: &Token) -> Self {
        let index = match token.literal {
            Some(Literal::Error(index)) => index,
            _ => UNEXPECTED_CHARACTER,
        };
        let message = LEX_ERROR_MESSAGES
            .get(index)
            .copied()
            .unwrap_or(LEX_ERROR_MESSAGES[UNEXPECTED_CHARACTER]);
        let message = if token.text.is_empty() {
            message.to_string()
        } else {
            format!("{}: {}", message, token.text)
        };
        LexError {
            message,
            location: token.location,
        }
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }
}

/// Lexer for Pascal source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input. The result always ends with either an
    /// `Eof` token or a single `Error` token.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            if let Err(token) = self.skip_whitespace_and_comments() {
                tokens.push(token);
                break;
            }

            if self.is_at_end() {
                tokens.push(Token::new(
                    TokenKind::Eof,
                    self.current_location(),
                    "",
                ));
                break;
            }

            let token = self.next_token();
            let failed = token.kind == TokenKind::Error;
            tokens.push(token);
            if failed {
                break;
            }
        }

        tokens
    }

    fn next_token(&mut self) -> Token {
        let loc = self.current_location();
        let Some(ch) = self.advance() else {
            return Token::new(TokenKind::Eof, loc, "");
        };

        let simple = |kind: TokenKind, text: &str| Token::new(kind, loc, text);

        match ch {
            '\'' => self.string_literal(loc),
            c if c.is_ascii_digit() => self.number_literal(c, loc),
            c if c.is_ascii_alphabetic() || c == '_' => {
                self.identifier_or_keyword(c, loc)
            }

            '+' => simple(TokenKind::Plus, "+"),
            '-' => simple(TokenKind::Minus, "-"),
            '*' => simple(TokenKind::Star, "*"),
            '/' => simple(TokenKind::Slash, "/"),
            '=' => simple(TokenKind::Eq, "="),
            '(' => simple(TokenKind::LParen, "("),
            ')' => simple(TokenKind::RParen, ")"),
            '[' => simple(TokenKind::LBracket, "["),
            ']' => simple(TokenKind::RBracket, "]"),
            ',' => simple(TokenKind::Comma, ","),
            ';' => simple(TokenKind::Semicolon, ";"),

            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    simple(TokenKind::Le, "<=")
                } else if self.peek() == Some('>') {
                    self.advance();
                    simple(TokenKind::NotEq, "<>")
                } else {
                    simple(TokenKind::Lt, "<")
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    simple(TokenKind::Ge, ">=")
                } else {
                    simple(TokenKind::Gt, ">")
                }
            }
            ':' => {
                if self.peek() == Some('=') {
                    self.advance();
                    simple(TokenKind::Assign, ":=")
                } else {
                    simple(TokenKind::Colon, ":")
                }
            }
            '.' => {
                if self.peek() == Some('.') {
                    self.advance();
                    simple(TokenKind::DotDot, "..")
                } else {
                    simple(TokenKind::Dot, ".")
                }
            }

            other => error_token(UNEXPECTED_CHARACTER, loc, other.to_string()),
        }
    }

    /// Quoted literal; a doubled quote stands for one quote character.
    fn string_literal(&mut self, loc: SourceLocation) -> Token {
        let mut value = String::new();
        let mut text = String::from("'");

        loop {
            match self.peek() {
                None | Some('\n') => {
                    return error_token(UNTERMINATED_STRING, loc, text);
                }
                Some('\'') => {
                    self.advance();
                    text.push('\'');
                    if self.peek() == Some('\'') {
                        self.advance();
                        text.push('\'');
                        value.push('\'');
                    } else {
                        break;
                    }
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                    value.push(c);
                }
            }
        }

        Token::new(TokenKind::StringLiteral, loc, text)
            .with_literal(Literal::Str(value))
    }

    /// Integer or real literal. `1..5` stays an integer followed by `..`.
    fn number_literal(&mut self, first_digit: char, loc: SourceLocation) -> Token {
        let mut text = String::new();
        text.push(first_digit);
        self.take_digits(&mut text);

        let mut is_real = false;
        if self.peek() == Some('.')
            && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit())
        {
            is_real = true;
            text.push('.');
            self.advance();
            self.take_digits(&mut text);
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            is_real = true;
            text.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.advance();
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return error_token(MALFORMED_NUMBER, loc, text);
            }
            self.take_digits(&mut text);
        }

        if is_real {
            match text.parse::<f64>() {
                Ok(value) => Token::new(TokenKind::RealLiteral, loc, text)
                    .with_literal(Literal::Real(value)),
                Err(_) => error_token(MALFORMED_NUMBER, loc, text),
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => Token::new(TokenKind::IntLiteral, loc, text)
                    .with_literal(Literal::Int(value)),
                Err(_) => error_token(MALFORMED_NUMBER, loc, text),
            }
        }
    }

    fn take_digits(&mut self, text: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(
        &mut self,
        first_char: char,
        loc: SourceLocation,
    ) -> Token {
        let mut text = String::new();
        text.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let lowered = text.to_ascii_lowercase();
        let kind = match lowered.as_str() {
            "program" => TokenKind::Program,
            "const" => TokenKind::Const,
            "var" => TokenKind::Var,
            "procedure" => TokenKind::Procedure,
            "function" => TokenKind::Function,
            "begin" => TokenKind::Begin,
            "end" => TokenKind::End,
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "to" => TokenKind::To,
            "downto" => TokenKind::Downto,
            "do" => TokenKind::Do,
            "while" => TokenKind::While,
            "exit" => TokenKind::Exit,
            "array" => TokenKind::Array,
            "of" => TokenKind::Of,
            "integer" => TokenKind::Integer,
            "real" => TokenKind::Real,
            "boolean" => TokenKind::Boolean,
            "char" => TokenKind::Char,
            "not" => TokenKind::Not,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "div" => TokenKind::Div,
            "mod" => TokenKind::Mod,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => {
                return Token::new(TokenKind::Ident, loc, text)
                    .with_literal(Literal::Str(lowered));
            }
        };

        Token::new(kind, loc, text)
    }

    /// Skip whitespace and comments. An unterminated comment yields the
    /// error token that ends the stream.
    fn skip_whitespace_and_comments(&mut self) -> Result<(), Token> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('{') => self.skip_block_comment(&['}'])?,
                Some('(') if self.peek_ahead(1) == Some('*') => {
                    self.skip_block_comment(&['*', ')'])?
                }
                Some('/') if self.peek_ahead(1) == Some('/') => {
                    self.skip_line_comment();
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip a comment whose opener starts at the cursor and which ends with
    /// the `terminator` sequence.
    fn skip_block_comment(&mut self, terminator: &[char]) -> Result<(), Token> {
        let loc = self.current_location();
        let opener_len = if terminator.len() == 1 { 1 } else { 2 };
        for _ in 0..opener_len {
            self.advance();
        }

        loop {
            if self.is_at_end() {
                return Err(error_token(UNTERMINATED_COMMENT, loc, ""));
            }
            let closes = terminator
                .iter()
                .enumerate()
                .all(|(i, c)| self.peek_ahead(i) == Some(*c));
            if closes {
                for _ in 0..terminator.len() {
                    self.advance();
                }
                return Ok(());
            }
            self.advance();
        }
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

fn error_token(index: usize, loc: SourceLocation, text: impl Into<String>) -> Token {
    Token::new(TokenKind::Error, loc, text).with_literal(Literal::Error(index))
}
