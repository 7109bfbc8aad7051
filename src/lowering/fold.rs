//! Constant folding
//!
//! [`fold`] rewrites an expression bottom-up, replacing every subtree whose
//! leaves are all scalar literals with the literal it evaluates to. The
//! result keeps the statically inferred type of the subtree: an `integer`
//! operation folds to an integer literal, `/` always folds to a real.
//!
//! Integer arithmetic is checked; an overflowing or zero-dividing subtree is
//! left as written for the C compiler to see. String literals and names are
//! never constant.

use crate::parser::ast::{BinaryOp, Expr, SourceLocation, UnaryOp};
use std::cmp::Ordering;

/// A compile-time scalar value
#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Int(i64),
    Real(f64),
    Char(char),
    Bool(bool),
}

impl Value {
    fn from_expr(expr: &Expr) -> Option<Value> {
        match expr {
            Expr::IntLiteral { value, .. } => Some(Value::Int(*value)),
            Expr::RealLiteral { value, .. } => Some(Value::Real(*value)),
            Expr::CharLiteral { value, .. } => Some(Value::Char(*value)),
            Expr::BoolLiteral { value, .. } => Some(Value::Bool(*value)),
            _ => None,
        }
    }

    fn into_expr(self, location: SourceLocation) -> Expr {
        match self {
            Value::Int(value) => Expr::IntLiteral { value, location },
            Value::Real(value) => Expr::RealLiteral { value, location },
            Value::Char(value) => Expr::CharLiteral { value, location },
            Value::Bool(value) => Expr::BoolLiteral { value, location },
        }
    }

    fn as_real(self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(n as f64),
            Value::Real(r) => Some(r),
            _ => None,
        }
    }
}

/// Fold `expr`, returning the rewritten tree and whether it is a constant.
pub fn fold(expr: &Expr) -> (Expr, bool) {
    match expr {
        Expr::IntLiteral { .. }
        | Expr::RealLiteral { .. }
        | Expr::CharLiteral { .. }
        | Expr::BoolLiteral { .. } => (expr.clone(), true),

        Expr::Variable {
            name,
            indices,
            location,
        } => (
            Expr::Variable {
                name: name.clone(),
                indices: fold_all(indices),
                location: *location,
            },
            false,
        ),

        Expr::Call {
            name,
            args,
            location,
        } => (
            Expr::Call {
                name: name.clone(),
                args: fold_all(args),
                location: *location,
            },
            false,
        ),

        Expr::Binary {
            op,
            left,
            right,
            location,
        } => {
            let (left, left_constant) = fold(left);
            let (right, right_constant) = fold(right);
            if left_constant && right_constant {
                let folded = Value::from_expr(&left)
                    .zip(Value::from_expr(&right))
                    .and_then(|(a, b)| evaluate_binary(*op, a, b));
                if let Some(value) = folded {
                    return (value.into_expr(*location), true);
                }
            }
            (
                Expr::Binary {
                    op: *op,
                    left: Box::new(left),
                    right: Box::new(right),
                    location: *location,
                },
                false,
            )
        }

        Expr::Unary {
            op,
            operand,
            location,
        } => {
            let (operand, constant) = fold(operand);
            if constant {
                if let Some(value) =
                    Value::from_expr(&operand).and_then(|v| evaluate_unary(*op, v))
                {
                    return (value.into_expr(*location), true);
                }
            }
            (
                Expr::Unary {
                    op: *op,
                    operand: Box::new(operand),
                    location: *location,
                },
                false,
            )
        }

        Expr::StringLiteral { .. } | Expr::UnresolvedName { .. } => (expr.clone(), false),
    }
}

fn fold_all(exprs: &[Expr]) -> Vec<Expr> {
    exprs.iter().map(|expr| fold(expr).0).collect()
}

fn evaluate_binary(op: BinaryOp, left: Value, right: Value) -> Option<Value> {
    use Value::{Bool, Int, Real};

    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
            if let (Int(a), Int(b)) = (left, right) {
                let result = match op {
                    BinaryOp::Add => a.checked_add(b),
                    BinaryOp::Sub => a.checked_sub(b),
                    _ => a.checked_mul(b),
                };
                return result.map(Int);
            }
            let (a, b) = (left.as_real()?, right.as_real()?);
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                _ => a * b,
            };
            result.is_finite().then_some(Real(result))
        }

        BinaryOp::RealDiv => {
            let (a, b) = (left.as_real()?, right.as_real()?);
            if b == 0.0 {
                return None;
            }
            let result = a / b;
            result.is_finite().then_some(Real(result))
        }

        BinaryOp::IntDiv | BinaryOp::Mod => match (left, right) {
            (Int(a), Int(b)) if op == BinaryOp::IntDiv => a.checked_div(b).map(Int),
            (Int(a), Int(b)) => a.checked_rem(b).map(Int),
            _ => None,
        },

        BinaryOp::And | BinaryOp::Or => match (left, right) {
            (Bool(a), Bool(b)) if op == BinaryOp::And => Some(Bool(a && b)),
            (Bool(a), Bool(b)) => Some(Bool(a || b)),
            _ => None,
        },

        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge => {
            let ordering = compare(left, right)?;
            let result = match op {
                BinaryOp::Eq => ordering == Ordering::Equal,
                BinaryOp::Ne => ordering != Ordering::Equal,
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Some(Bool(result))
        }
    }
}

fn compare(left: Value, right: Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(&b)),
        (Value::Char(a), Value::Char(b)) => Some(a.cmp(&b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(&b)),
        _ => left.as_real()?.partial_cmp(&right.as_real()?),
    }
}

fn evaluate_unary(op: UnaryOp, operand: Value) -> Option<Value> {
    match (op, operand) {
        (UnaryOp::Plus, Value::Int(_) | Value::Real(_)) => Some(operand),
        (UnaryOp::Neg, Value::Int(n)) => n.checked_neg().map(Value::Int),
        (UnaryOp::Neg, Value::Real(r)) => Some(Value::Real(-r)),
        (UnaryOp::Not, Value::Bool(b)) => Some(Value::Bool(!b)),
        _ => None,
    }
}
