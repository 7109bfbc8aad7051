//! Type inference for expressions
//!
//! [`TypeQuery`] computes the type of an expression against a finished or
//! partially built [`SymbolTable`]. It never mutates the table, which lets
//! both the analyzer and lowering use it.
//!
//! # Inference Rules
//!
//! - Literals have their intrinsic type
//! - Names and calls take the type of the item they resolve to
//! - `+ - *` unify their operands and need a numeric result
//! - `/` unifies numeric operands and always yields `real`
//! - `div` and `mod` need two integers
//! - comparisons need unifiable operands and yield `boolean`
//! - `and`, `or` and `not` work on booleans only
//!
//! An operand already typed `ERROR` yields `ERROR` without a second
//! diagnostic.

use crate::parser::ast::*;
use crate::semantic::builtins::Builtin;
use crate::semantic::errors::SemanticError;
use crate::semantic::symbols::{ArgInfo, ItemKind, LookupError, ScopeId, SymbolTable};
use crate::semantic::types::{max_type, BaseType, Type};

/// Read-only type queries over a symbol table
#[derive(Clone, Copy)]
pub struct TypeQuery<'t> {
    table: &'t SymbolTable,
}

impl<'t> TypeQuery<'t> {
    pub fn new(table: &'t SymbolTable) -> Self {
        Self { table }
    }

    /// Infer the type of `expr` in `scope`, appending any diagnostics.
    pub fn type_of(
        &self,
        expr: &Expr,
        scope: ScopeId,
        errors: &mut Vec<SemanticError>,
    ) -> Type {
        match expr {
            Expr::IntLiteral { .. } => Type::INT,
            Expr::RealLiteral { .. } => Type::REAL,
            Expr::CharLiteral { .. } => Type::CHAR,
            Expr::BoolLiteral { .. } => Type::BOOL,
            Expr::StringLiteral { .. } => Type::STR,

            Expr::Variable {
                name,
                indices,
                location,
            } => self.variable_type(name, indices, *location, scope, errors),

            Expr::UnresolvedName { name, location } => {
                match self.table.resolve_name(scope, name) {
                    Ok(item) => item.ty.clone(),
                    Err(err) => {
                        errors.push(lookup_error(err, name, &[], *location));
                        Type::ERROR
                    }
                }
            }

            Expr::Call {
                name,
                args,
                location,
            } => self.call_type(name, args, *location, scope, errors),

            Expr::Binary {
                op,
                left,
                right,
                location,
            } => {
                let left = self.type_of(left, scope, errors);
                let right = self.type_of(right, scope, errors);
                binary_type(*op, &left, &right, *location, errors)
            }

            Expr::Unary {
                op,
                operand,
                location,
            } => {
                let operand = self.type_of(operand, scope, errors);
                unary_type(*op, &operand, *location, errors)
            }
        }
    }

    /// Type of `name[indices]` where `name` must be a variable or constant.
    pub fn variable_type(
        &self,
        name: &str,
        indices: &[Expr],
        location: SourceLocation,
        scope: ScopeId,
        errors: &mut Vec<SemanticError>,
    ) -> Type {
        let item = self
            .table
            .find_data(scope, name)
            .or_else(|| self.table.find_return_slot(scope, name));

        let Some(item) = item else {
            if self.table.contains(scope, name) {
                errors.push(SemanticError::type_mismatch(
                    format!("'{}' is not a variable", name),
                    location,
                ));
            } else {
                errors.push(SemanticError::NotFound {
                    name: name.to_string(),
                    location,
                });
            }
            return Type::ERROR;
        };

        self.index_type(&item.ty, name, indices, location, scope, errors)
    }

    /// Apply `indices` to a value of type `ty`.
    pub fn index_type(
        &self,
        ty: &Type,
        name: &str,
        indices: &[Expr],
        location: SourceLocation,
        scope: ScopeId,
        errors: &mut Vec<SemanticError>,
    ) -> Type {
        let mut failed = false;
        for index in indices {
            let index_ty = self.type_of(index, scope, errors);
            if index_ty.is_error() {
                failed = true;
            } else if !index_ty.is(BaseType::Int) {
                errors.push(SemanticError::type_mismatch(
                    format!("array index must be integer, found {}", index_ty),
                    index.location(),
                ));
                failed = true;
            }
        }

        match ty.indexed(indices.len()) {
            Some(_) if failed => Type::ERROR,
            Some(result) => result,
            None => {
                errors.push(SemanticError::type_mismatch(
                    format!(
                        "'{}' has {} dimension(s) but {} index(es) were given",
                        name,
                        ty.dims.len(),
                        indices.len()
                    ),
                    location,
                ));
                Type::ERROR
            }
        }
    }

    fn call_type(
        &self,
        name: &str,
        args: &[Expr],
        location: SourceLocation,
        scope: ScopeId,
        errors: &mut Vec<SemanticError>,
    ) -> Type {
        let infos = self.arg_infos(args, scope, errors);
        if Builtin::from_name(name).is_some() && !self.table.contains(scope, name) {
            return Type::VOID;
        }
        if infos.iter().any(|info| info.ty.is_error()) {
            return Type::ERROR;
        }

        match self.table.find_callable(scope, name, &infos) {
            Ok(item) => item.ty.clone(),
            Err(err) => {
                errors.push(lookup_error(err, name, &infos, location));
                Type::ERROR
            }
        }
    }

    /// Type and lvalue-ness of each actual argument.
    pub fn arg_infos(
        &self,
        args: &[Expr],
        scope: ScopeId,
        errors: &mut Vec<SemanticError>,
    ) -> Vec<ArgInfo> {
        args.iter()
            .map(|arg| ArgInfo {
                ty: self.type_of(arg, scope, errors),
                is_variable: self.is_variable(arg, scope),
            })
            .collect()
    }

    /// Whether `expr` denotes a mutable storage location.
    pub fn is_variable(&self, expr: &Expr, scope: ScopeId) -> bool {
        match expr {
            Expr::Variable { name, .. } => self
                .table
                .find_data(scope, name)
                .or_else(|| self.table.find_return_slot(scope, name))
                .is_some_and(|item| item.is_variable()),
            Expr::UnresolvedName { name, .. } => self
                .table
                .resolve_name(scope, name)
                .is_ok_and(|item| item.is_variable()),
            _ => false,
        }
    }

    /// Whether `expr` is a constant initializer: a literal, a signed
    /// numeric literal or the name of another constant.
    pub fn is_constant_value(&self, expr: &Expr, scope: ScopeId) -> bool {
        match expr {
            Expr::Unary {
                op: UnaryOp::Neg | UnaryOp::Plus,
                operand,
                ..
            } => matches!(
                operand.as_ref(),
                Expr::IntLiteral { .. } | Expr::RealLiteral { .. }
            ),
            Expr::UnresolvedName { name, .. } => self
                .table
                .resolve_name(scope, name)
                .is_ok_and(|item| item.kind == ItemKind::Constant),
            other => other.is_scalar_literal() || matches!(other, Expr::StringLiteral { .. }),
        }
    }
}

/// Result type of a binary operation.
pub fn binary_type(
    op: BinaryOp,
    left: &Type,
    right: &Type,
    location: SourceLocation,
    errors: &mut Vec<SemanticError>,
) -> Type {
    if left.is_error() || right.is_error() {
        return Type::ERROR;
    }

    let unified = max_type(left, right);
    let result = match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
            Some(unified).filter(Type::is_numeric)
        }
        BinaryOp::RealDiv => unified.is_numeric().then_some(Type::REAL),
        BinaryOp::IntDiv | BinaryOp::Mod => (left.is(BaseType::Int)
            && right.is(BaseType::Int))
        .then_some(Type::INT),
        BinaryOp::And | BinaryOp::Or => (left.is(BaseType::Bool)
            && right.is(BaseType::Bool))
        .then_some(Type::BOOL),
        // C compares string pointers, not text
        _ => (!unified.is_error() && !unified.is(BaseType::Str)).then_some(Type::BOOL),
    };

    result.unwrap_or_else(|| {
        errors.push(SemanticError::type_mismatch(
            format!(
                "operator '{}' cannot be applied to {} and {}",
                op.symbol(),
                left,
                right
            ),
            location,
        ));
        Type::ERROR
    })
}

/// Result type of a prefix operation.
pub fn unary_type(
    op: UnaryOp,
    operand: &Type,
    location: SourceLocation,
    errors: &mut Vec<SemanticError>,
) -> Type {
    if operand.is_error() {
        return Type::ERROR;
    }

    let valid = match op {
        UnaryOp::Neg | UnaryOp::Plus => operand.is_numeric(),
        UnaryOp::Not => operand.is(BaseType::Bool),
    };
    if valid {
        operand.clone()
    } else {
        errors.push(SemanticError::type_mismatch(
            format!(
                "operator '{}' cannot be applied to {}",
                op.symbol().trim(),
                operand
            ),
            location,
        ));
        Type::ERROR
    }
}

/// Turn a failed lookup into a located diagnostic.
pub fn lookup_error(
    err: LookupError,
    name: &str,
    args: &[ArgInfo],
    location: SourceLocation,
) -> SemanticError {
    let name = name.to_string();
    match err {
        LookupError::NotFound => SemanticError::NotFound { name, location },
        LookupError::NotAFunction => SemanticError::NotAFunction { name, location },
        LookupError::Duplicate => {
            SemanticError::DuplicateDeclaration { name, location }
        }
        LookupError::ParameterMismatch => SemanticError::ParameterMismatch {
            name,
            arguments: args
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            location,
        },
    }
}
