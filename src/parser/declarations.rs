//! Declaration parsing
//!
//! Grammar handled here:
//! ```text
//! program_head    -> 'program' id [ '(' id_list ')' ] ';'
//! program_body    -> [const_decls] [var_decls] {subprogram ';'} compound
//! const_decls     -> 'const' { id '=' const_value ';' }
//! var_decls       -> 'var' { id_list ':' type ';' }
//! type            -> basic_type | 'array' '[' period {',' period} ']' 'of' basic_type
//! period          -> ['-'] int '..' ['-'] int
//! subprogram      -> subprogram_head subprogram_body
//! subprogram_head -> 'procedure' id [params] ';'
//!                  | 'function' id [params] ':' basic_type ';'
//! params          -> '(' [parameter {';' parameter}] ')'
//! parameter       -> ['var'] id_list ':' basic_type
//! ```

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Literal, TokenKind};
use crate::parser::parse::{ParseResult, Parser};

const CONST_SYNC: &[TokenKind] = &[
    TokenKind::Semicolon,
    TokenKind::Var,
    TokenKind::Procedure,
    TokenKind::Function,
    TokenKind::Begin,
];

const VAR_SYNC: &[TokenKind] = &[
    TokenKind::Semicolon,
    TokenKind::Procedure,
    TokenKind::Function,
    TokenKind::Begin,
];

const SUBPROGRAM_HEAD_SYNC: &[TokenKind] = &[
    TokenKind::Semicolon,
    TokenKind::Const,
    TokenKind::Var,
    TokenKind::Begin,
];

impl Parser {
    pub(crate) fn parse_program_head(&mut self) -> ParseResult<ProgramHead> {
        let location = self.current_location();
        self.expect(TokenKind::Program, "Expected 'program'")?;
        let (name, _) = self.expect_identifier("Expected program name")?;

        let mut parameters = Vec::new();
        if self.match_token(TokenKind::LParen) {
            parameters = self.parse_identifier_list("Expected identifier")?;
            self.expect(TokenKind::RParen, "Expected ')' after program parameters")?;
        }
        self.expect(TokenKind::Semicolon, "Expected ';' after program head")?;

        Ok(ProgramHead {
            name,
            parameters,
            location,
        })
    }

    pub(crate) fn parse_program_body(&mut self) -> Result<ProgramBody, LexError> {
        let consts = self.parse_const_section()?;
        let vars = self.parse_var_section()?;

        let mut subprograms = Vec::new();
        while matches!(
            self.peek_kind(),
            TokenKind::Procedure | TokenKind::Function
        ) {
            if let Some(subprogram) = self.parse_subprogram()? {
                subprograms.push(subprogram);
            }
        }

        let (statements, location) = self.parse_block_statements()?;

        Ok(ProgramBody {
            consts,
            vars,
            subprograms,
            statements,
            location,
        })
    }

    /// `[ 'const' { id '=' value ';' } ]` with per-declaration recovery.
    pub(crate) fn parse_const_section(
        &mut self,
    ) -> Result<Vec<ConstDeclaration>, LexError> {
        let mut consts = Vec::new();
        if !self.match_token(TokenKind::Const) {
            return Ok(consts);
        }

        if !self.check(TokenKind::Ident) {
            let err = self.error_at_current("Expected identifier after 'const'");
            self.record(err)?;
        }

        while self.check(TokenKind::Ident) {
            match self.parse_const_declaration() {
                Ok(decl) => consts.push(decl),
                Err(err) => {
                    self.record(err)?;
                    self.synchronize(CONST_SYNC)?;
                    self.match_token(TokenKind::Semicolon);
                }
            }
        }

        Ok(consts)
    }

    fn parse_const_declaration(&mut self) -> ParseResult<ConstDeclaration> {
        let (name, location) = self.expect_identifier("Expected constant name")?;
        self.expect(TokenKind::Eq, "Expected '=' in constant declaration")?;
        let value = self.parse_prefix()?;
        self.expect(TokenKind::Semicolon, "Expected ';' after constant")?;

        Ok(ConstDeclaration {
            name,
            value,
            location,
        })
    }

    /// `[ 'var' { id_list ':' type ';' } ]` with per-declaration recovery.
    pub(crate) fn parse_var_section(
        &mut self,
    ) -> Result<Vec<VarDeclaration>, LexError> {
        let mut vars = Vec::new();
        if !self.match_token(TokenKind::Var) {
            return Ok(vars);
        }

        if !self.check(TokenKind::Ident) {
            let err = self.error_at_current("Expected identifier after 'var'");
            self.record(err)?;
        }

        while self.check(TokenKind::Ident) {
            match self.parse_var_declaration() {
                Ok(decl) => vars.push(decl),
                Err(err) => {
                    self.record(err)?;
                    self.synchronize(VAR_SYNC)?;
                    self.match_token(TokenKind::Semicolon);
                }
            }
        }

        Ok(vars)
    }

    fn parse_var_declaration(&mut self) -> ParseResult<VarDeclaration> {
        let location = self.current_location();
        let names = self.parse_identifier_list("Expected variable name")?;
        self.expect(TokenKind::Colon, "Expected ':' after variable names")?;
        let type_spec = self.parse_type()?;
        self.expect(TokenKind::Semicolon, "Expected ';' after variable declaration")?;

        Ok(VarDeclaration {
            names,
            type_spec,
            location,
        })
    }

    pub(crate) fn parse_type(&mut self) -> ParseResult<TypeSpec> {
        if !self.match_token(TokenKind::Array) {
            return Ok(TypeSpec::Basic(self.parse_basic_type()?));
        }

        self.expect(TokenKind::LBracket, "Expected '[' after 'array'")?;
        let mut periods = vec![self.parse_period()?];
        while self.match_token(TokenKind::Comma) {
            periods.push(self.parse_period()?);
        }
        self.expect(TokenKind::RBracket, "Expected ']' after array bounds")?;
        self.expect(TokenKind::Of, "Expected 'of' after array bounds")?;
        let element = self.parse_basic_type()?;

        Ok(TypeSpec::Array { periods, element })
    }

    pub(crate) fn parse_basic_type(&mut self) -> ParseResult<BasicType> {
        let basic = match self.peek_kind() {
            TokenKind::Integer => BasicType::Integer,
            TokenKind::Real => BasicType::Real,
            TokenKind::Boolean => BasicType::Boolean,
            TokenKind::Char => BasicType::Char,
            _ => return Err(self.error_at_current("Expected type name")),
        };
        self.advance();
        Ok(basic)
    }

    fn parse_period(&mut self) -> ParseResult<Period> {
        let location = self.current_location();
        let lower = self.parse_bound()?;
        self.expect(TokenKind::DotDot, "Expected '..' in array bounds")?;
        let upper = self.parse_bound()?;

        if lower > upper {
            return Err(self.error_at(
                location,
                format!("Array lower bound {} exceeds upper bound {}", lower, upper),
            ));
        }
        let period = Period::new(lower, upper);
        if period.len().is_none() {
            return Err(self.error_at(
                location,
                format!("Array bounds {}..{} are too large", lower, upper),
            ));
        }
        Ok(period)
    }

    fn parse_bound(&mut self) -> ParseResult<i64> {
        let negative = self.match_token(TokenKind::Minus);
        let token = self.expect(TokenKind::IntLiteral, "Expected integer bound")?;
        let value = match token.literal {
            Some(Literal::Int(value)) => value,
            _ => 0,
        };
        Ok(if negative { -value } else { value })
    }

    /// Parse a subprogram and the `;` after it. A broken head is reported
    /// and its body still consumed so the next declaration starts cleanly;
    /// such a subprogram yields `None`.
    pub(crate) fn parse_subprogram(
        &mut self,
    ) -> Result<Option<Subprogram>, LexError> {
        let head = match self.parse_subprogram_head() {
            Ok(head) => Some(head),
            Err(err) => {
                self.record(err)?;
                self.synchronize(SUBPROGRAM_HEAD_SYNC)?;
                self.match_token(TokenKind::Semicolon);
                None
            }
        };

        let body = self.parse_subprogram_body()?;

        if let Err(err) =
            self.expect(TokenKind::Semicolon, "Expected ';' after subprogram")
        {
            self.record(err)?;
        }

        Ok(head.map(|head| Subprogram { head, body }))
    }

    pub(crate) fn parse_subprogram_head(&mut self) -> ParseResult<SubprogramHead> {
        let location = self.current_location();
        let is_function = match self.peek_kind() {
            TokenKind::Function => true,
            TokenKind::Procedure => false,
            _ => {
                return Err(
                    self.error_at_current("Expected 'procedure' or 'function'")
                )
            }
        };
        self.advance();

        let (name, _) = self.expect_identifier("Expected subprogram name")?;

        let mut parameters = Vec::new();
        if self.match_token(TokenKind::LParen) {
            if !self.check(TokenKind::RParen) {
                parameters.push(self.parse_parameter()?);
                while self.match_token(TokenKind::Semicolon) {
                    parameters.push(self.parse_parameter()?);
                }
            }
            self.expect(TokenKind::RParen, "Expected ')' after parameters")?;
        }

        let return_type = if is_function {
            self.expect(TokenKind::Colon, "Expected ':' before return type")?;
            Some(self.parse_basic_type()?)
        } else {
            None
        };

        self.expect(TokenKind::Semicolon, "Expected ';' after subprogram head")?;

        Ok(SubprogramHead {
            name,
            parameters,
            return_type,
            location,
        })
    }

    fn parse_parameter(&mut self) -> ParseResult<Parameter> {
        let location = self.current_location();
        let is_reference = self.match_token(TokenKind::Var);
        let names = self.parse_identifier_list("Expected parameter name")?;
        self.expect(TokenKind::Colon, "Expected ':' after parameter names")?;
        let param_type = self.parse_basic_type()?;

        Ok(Parameter {
            is_reference,
            names,
            param_type,
            location,
        })
    }

    pub(crate) fn parse_subprogram_body(
        &mut self,
    ) -> Result<SubprogramBody, LexError> {
        let consts = self.parse_const_section()?;
        let vars = self.parse_var_section()?;
        let (statements, location) = self.parse_block_statements()?;

        Ok(SubprogramBody {
            consts,
            vars,
            statements,
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::{ParseOutput, Parser};

    fn parse_source(source: &str) -> ParseOutput {
        Parser::from_source(source).parse_program().unwrap()
    }

    #[test]
    fn test_const_declarations() {
        let output = parse_source(
            "program p; const n = 10; r = -2.5; c = 'x'; s = 'hi'; begin end.",
        );
        assert!(output.errors.is_empty(), "{:?}", output.errors);

        let consts = &output.program.body.consts;
        assert_eq!(consts.len(), 4);
        assert!(matches!(consts[0].value, Expr::IntLiteral { value: 10, .. }));
        assert!(matches!(
            consts[1].value,
            Expr::Unary { op: UnaryOp::Neg, .. }
        ));
        assert!(matches!(consts[2].value, Expr::CharLiteral { value: 'x', .. }));
        assert!(matches!(consts[3].value, Expr::StringLiteral { .. }));
    }

    #[test]
    fn test_array_type() {
        let output = parse_source(
            "program p; var a: array[1..10, -2..2] of real; begin end.",
        );
        assert!(output.errors.is_empty());

        let decl = &output.program.body.vars[0];
        assert_eq!(
            decl.type_spec,
            TypeSpec::Array {
                periods: vec![Period::new(1, 10), Period::new(-2, 2)],
                element: BasicType::Real,
            }
        );
    }

    #[test]
    fn test_inverted_bounds_are_reported() {
        let output =
            parse_source("program p; var a: array[5..1] of integer; begin end.");
        assert_eq!(output.errors.len(), 1);
        assert!(output.errors[0].message.contains("exceeds upper bound"));
    }

    #[test]
    fn test_oversized_bounds_are_reported() {
        let output = parse_source(
            "program p;
             var a: array[0..9223372036854775807] of integer;
                 b: array[-9223372036854775807..9223372036854775807] of real;
                 c: array[1..3] of char;
             begin end.",
        );
        assert_eq!(output.errors.len(), 2, "{:?}", output.errors);
        assert!(output.errors[0].message.contains("too large"));
        assert_eq!(output.errors[1].location, SourceLocation::new(3, 27));
        assert_eq!(output.program.body.vars.len(), 1);
    }

    #[test]
    fn test_subprogram_heads() {
        let output = parse_source(
            "program p;
             function add(a, b: integer; var c: real): integer;
             begin add := a + b end;
             procedure show;
             begin end;
             begin end.",
        );
        assert!(output.errors.is_empty(), "{:?}", output.errors);

        let subs = &output.program.body.subprograms;
        assert_eq!(subs.len(), 2);

        let add = &subs[0].head;
        assert_eq!(add.name, "add");
        assert_eq!(add.return_type, Some(BasicType::Integer));
        let flat: Vec<_> = add.flat_parameters().collect();
        assert_eq!(
            flat,
            vec![
                ("a", BasicType::Integer, false),
                ("b", BasicType::Integer, false),
                ("c", BasicType::Real, true),
            ]
        );

        assert!(!subs[1].head.is_function());
        assert!(subs[1].head.parameters.is_empty());
    }

    #[test]
    fn test_bad_var_declaration_recovers() {
        let output = parse_source(
            "program p; var a: integer; b: ; c: real; begin end.",
        );
        assert_eq!(output.errors.len(), 1);
        let names: Vec<_> = output
            .program
            .body
            .vars
            .iter()
            .flat_map(|v| v.names.clone())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_broken_subprogram_head_keeps_siblings() {
        let output = parse_source(
            "program p;
             procedure bad(: integer);
             begin end;
             procedure good;
             begin end;
             begin end.",
        );
        assert_eq!(output.errors.len(), 1);
        let subs = &output.program.body.subprograms;
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].head.name, "good");
    }
}
