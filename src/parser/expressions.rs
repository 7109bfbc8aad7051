//! Expression parsing
//!
//! Precedence climbing over a table of prefix parsers. Binding strengths,
//! loosest first:
//! ```text
//! 1  = <> < <= > >=
//! 2  + - or
//! 3  * / div mod and
//! 4  prefix + - not
//! ```
//! Binary operators are left-associative. A prefix operator applies to a
//! single primary, so `-(1+2)*3` is `(-(1+2))*3`.

use crate::parser::ast::*;
use crate::parser::lexer::{Literal, TokenKind};
use crate::parser::parse::{ParseResult, Parser};

type PrefixParser = fn(&mut Parser) -> ParseResult<Expr>;

/// Leading-token dispatch table
fn prefix_parser(kind: TokenKind) -> Option<PrefixParser> {
    let parser: PrefixParser = match kind {
        TokenKind::IntLiteral | TokenKind::RealLiteral => Parser::parse_number,
        TokenKind::StringLiteral => Parser::parse_quoted,
        TokenKind::True | TokenKind::False => Parser::parse_boolean,
        TokenKind::LParen => Parser::parse_parenthesized,
        TokenKind::Plus | TokenKind::Minus | TokenKind::Not => {
            Parser::parse_unary
        }
        TokenKind::Ident => Parser::parse_identifier_primary,
        _ => return None,
    };
    Some(parser)
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Eq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::Ne,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Le => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::Ge => BinaryOp::Ge,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Or => BinaryOp::Or,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::RealDiv,
        TokenKind::Div => BinaryOp::IntDiv,
        TokenKind::Mod => BinaryOp::Mod,
        TokenKind::And => BinaryOp::And,
        _ => return None,
    };
    Some(op)
}

impl Parser {
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_expr(1)
    }

    /// Parse operators binding at least as tightly as `min_precedence`.
    pub(crate) fn parse_expr(&mut self, min_precedence: u8) -> ParseResult<Expr> {
        let mut left = self.parse_prefix()?;

        while let Some(op) = binary_op(self.peek_kind()) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();

            let right = self.parse_expr(precedence + 1)?;
            let location = left.location();
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    pub(crate) fn parse_prefix(&mut self) -> ParseResult<Expr> {
        match prefix_parser(self.peek_kind()) {
            Some(parse) => parse(self),
            None => Err(self.error_at_current("Expected expression")),
        }
    }

    fn parse_number(&mut self) -> ParseResult<Expr> {
        let token = self.advance();
        let location = token.location;
        match token.literal {
            Some(Literal::Int(value)) => Ok(Expr::IntLiteral { value, location }),
            Some(Literal::Real(value)) => {
                Ok(Expr::RealLiteral { value, location })
            }
            _ => Err(self.error_at(
                location,
                format!("Malformed number '{}'", token.text),
            )),
        }
    }

    /// A quoted single ASCII character is a char, anything else a string.
    /// C `char` holds one byte, so `'é'` is a string.
    fn parse_quoted(&mut self) -> ParseResult<Expr> {
        let token = self.advance();
        let location = token.location;
        let value = match token.literal {
            Some(Literal::Str(value)) => value,
            _ => String::new(),
        };

        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii() => Ok(Expr::CharLiteral { value: c, location }),
            _ => Ok(Expr::StringLiteral { value, location }),
        }
    }

    fn parse_boolean(&mut self) -> ParseResult<Expr> {
        let token = self.advance();
        Ok(Expr::BoolLiteral {
            value: token.kind == TokenKind::True,
            location: token.location,
        })
    }

    fn parse_parenthesized(&mut self) -> ParseResult<Expr> {
        self.advance();
        let expr = self.parse_expression()?;
        self.expect(TokenKind::RParen, "Expected ')' after expression")?;
        Ok(expr)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let token = self.advance();
        let op = match token.kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            _ => UnaryOp::Plus,
        };
        let operand = self.parse_expr(UnaryOp::PRECEDENCE + 1)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            location: token.location,
        })
    }

    /// `id`, `id(args)` or `id[indices]`, decided by one token of lookahead.
    fn parse_identifier_primary(&mut self) -> ParseResult<Expr> {
        let (name, location) = self.expect_identifier("Expected identifier")?;

        match self.peek_kind() {
            TokenKind::LParen => {
                let args = self.parse_argument_list()?;
                Ok(Expr::Call {
                    name,
                    args,
                    location,
                })
            }
            TokenKind::LBracket => {
                let indices = self.parse_index_list()?;
                Ok(Expr::Variable {
                    name,
                    indices,
                    location,
                })
            }
            _ => Ok(Expr::UnresolvedName { name, location }),
        }
    }

    /// `'(' [expr {',' expr}] ')'`
    pub(crate) fn parse_argument_list(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(TokenKind::LParen, "Expected '('")?;
        let mut args = Vec::new();
        if self.match_token(TokenKind::RParen) {
            return Ok(args);
        }

        args.push(self.parse_expression()?);
        while self.match_token(TokenKind::Comma) {
            args.push(self.parse_expression()?);
        }
        self.expect(TokenKind::RParen, "Expected ')' after arguments")?;
        Ok(args)
    }

    /// `'[' expr {',' expr} ']'`
    pub(crate) fn parse_index_list(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(TokenKind::LBracket, "Expected '['")?;
        let mut indices = vec![self.parse_expression()?];
        while self.match_token(TokenKind::Comma) {
            indices.push(self.parse_expression()?);
        }
        self.expect(TokenKind::RBracket, "Expected ']' after indices")?;
        Ok(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expr(source: &str) -> Expr {
        let mut parser = Parser::from_source(source);
        let expr = parser.parse_expression().expect("expression parses");
        assert!(parser.is_at_end(), "trailing input in {:?}", source);
        expr
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(parse_expr("1+2+3").to_string(), "((1 + 2) + 3)");
        assert_eq!(parse_expr("8 div 4 div 2").to_string(), "((8 div 4) div 2)");
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        assert_eq!(parse_expr("1+2*3").to_string(), "(1 + (2 * 3))");
        assert_eq!(
            parse_expr("a or b and c").to_string(),
            "(a or (b and c))"
        );
    }

    #[test]
    fn test_comparison_is_loosest() {
        assert_eq!(
            parse_expr("a + 1 <= b * 2").to_string(),
            "((a + 1) <= (b * 2))"
        );
    }

    #[test]
    fn test_unary_binds_to_primary() {
        assert_eq!(parse_expr("-(1+2)*3").to_string(), "((-(1 + 2)) * 3)");
        assert_eq!(parse_expr("not a = b").to_string(), "((not a) = b)");
        assert_eq!(parse_expr("- -x").to_string(), "(-(-x))");
    }

    #[test]
    fn test_identifier_led_primaries() {
        assert!(matches!(
            parse_expr("f(1, x)"),
            Expr::Call { ref args, .. } if args.len() == 2
        ));
        assert!(matches!(
            parse_expr("g()"),
            Expr::Call { ref args, .. } if args.is_empty()
        ));
        assert!(matches!(
            parse_expr("a[i, 2]"),
            Expr::Variable { ref indices, .. } if indices.len() == 2
        ));
        assert!(matches!(
            parse_expr("count"),
            Expr::UnresolvedName { ref name, .. } if name == "count"
        ));
    }

    #[test]
    fn test_literals() {
        assert!(matches!(parse_expr("42"), Expr::IntLiteral { value: 42, .. }));
        assert!(matches!(parse_expr("'z'"), Expr::CharLiteral { value: 'z', .. }));
        assert!(matches!(
            parse_expr("'zz'"),
            Expr::StringLiteral { ref value, .. } if value == "zz"
        ));
        assert!(matches!(
            parse_expr("'é'"),
            Expr::StringLiteral { ref value, .. } if value == "é"
        ));
        assert!(matches!(
            parse_expr("TRUE"),
            Expr::BoolLiteral { value: true, .. }
        ));
    }

    #[test]
    fn test_binary_location_is_first_token() {
        let expr = parse_expr("  x * 2");
        assert_eq!(expr.location(), SourceLocation::new(1, 3));
    }

    #[test]
    fn test_missing_operand() {
        let mut parser = Parser::from_source("1 + ");
        assert!(parser.parse_expression().is_err());
    }
}
