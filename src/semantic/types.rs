//! Semantic types and unification
//!
//! # Unification rules
//!
//! [`max_type`] is the common type of two operands:
//! - identical scalar types unify to themselves
//! - any mix of `integer` and `real` unifies to `real`
//! - everything else, including arrays of any shape, is [`BaseType::Error`]

use crate::parser::ast::{BasicType, Period, TypeSpec};
use std::fmt;

/// Scalar type of a value, or a marker for procedures and failed inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Int,
    Real,
    Bool,
    Char,
    Str,
    Void,
    Error,
}

/// A base type plus array dimensions (empty for scalars)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    pub base: BaseType,
    pub dims: Vec<Period>,
}

impl Type {
    pub const INT: Type = Type::new(BaseType::Int);
    pub const REAL: Type = Type::new(BaseType::Real);
    pub const BOOL: Type = Type::new(BaseType::Bool);
    pub const CHAR: Type = Type::new(BaseType::Char);
    pub const STR: Type = Type::new(BaseType::Str);
    pub const VOID: Type = Type::new(BaseType::Void);
    pub const ERROR: Type = Type::new(BaseType::Error);

    pub const fn new(base: BaseType) -> Self {
        Type {
            base,
            dims: Vec::new(),
        }
    }

    pub fn with_dims(mut self, dims: Vec<Period>) -> Self {
        self.dims = dims;
        self
    }

    pub fn from_basic(basic: BasicType) -> Self {
        Type::new(match basic {
            BasicType::Integer => BaseType::Int,
            BasicType::Real => BaseType::Real,
            BasicType::Boolean => BaseType::Bool,
            BasicType::Char => BaseType::Char,
        })
    }

    pub fn from_spec(spec: &TypeSpec) -> Self {
        match spec {
            TypeSpec::Basic(basic) => Type::from_basic(*basic),
            TypeSpec::Array { periods, element } => {
                Type::from_basic(*element).with_dims(periods.clone())
            }
        }
    }

    pub fn is_error(&self) -> bool {
        self.base == BaseType::Error
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    pub fn is_numeric(&self) -> bool {
        self.is_scalar() && matches!(self.base, BaseType::Int | BaseType::Real)
    }

    /// Exactly `base`, with no dimensions.
    pub fn is(&self, base: BaseType) -> bool {
        self.is_scalar() && self.base == base
    }

    /// Type left after applying `count` indices, if that many dimensions exist.
    pub fn indexed(&self, count: usize) -> Option<Type> {
        if count > self.dims.len() {
            return None;
        }
        Some(Type::new(self.base).with_dims(self.dims[count..].to_vec()))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.dims.is_empty() {
            write!(f, "array[")?;
            for (i, period) in self.dims.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}..{}", period.lower, period.upper)?;
            }
            write!(f, "] of ")?;
        }
        let name = match self.base {
            BaseType::Int => "integer",
            BaseType::Real => "real",
            BaseType::Bool => "boolean",
            BaseType::Char => "char",
            BaseType::Str => "string",
            BaseType::Void => "void",
            BaseType::Error => "<error>",
        };
        write!(f, "{}", name)
    }
}

/// Common type of two operands, or `ERROR` when there is none.
pub fn max_type(left: &Type, right: &Type) -> Type {
    if !left.is_scalar() || !right.is_scalar() {
        return Type::ERROR;
    }
    match (left.base, right.base) {
        (BaseType::Error, _) | (_, BaseType::Error) => Type::ERROR,
        (BaseType::Void, _) | (_, BaseType::Void) => Type::ERROR,
        (BaseType::Int, BaseType::Real)
        | (BaseType::Real, BaseType::Int)
        | (BaseType::Real, BaseType::Real) => Type::REAL,
        (a, b) if a == b => Type::new(a),
        _ => Type::ERROR,
    }
}

/// Whether a `value` may be stored into a `target` slot without narrowing.
pub fn assignable(target: &Type, value: &Type) -> bool {
    target.is_scalar()
        && !target.is_error()
        && target.base != BaseType::Void
        && max_type(target, value) == *target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_type() {
        assert_eq!(max_type(&Type::INT, &Type::INT), Type::INT);
        assert_eq!(max_type(&Type::INT, &Type::REAL), Type::REAL);
        assert_eq!(max_type(&Type::REAL, &Type::INT), Type::REAL);
        assert_eq!(max_type(&Type::REAL, &Type::REAL), Type::REAL);
        assert_eq!(max_type(&Type::BOOL, &Type::INT), Type::ERROR);
        assert_eq!(max_type(&Type::CHAR, &Type::CHAR), Type::CHAR);
        assert_eq!(max_type(&Type::VOID, &Type::VOID), Type::ERROR);
    }

    #[test]
    fn test_arrays_never_unify() {
        let array = Type::INT.with_dims(vec![Period::new(1, 3)]);
        assert_eq!(max_type(&array, &array), Type::ERROR);
        assert_eq!(max_type(&array, &Type::INT), Type::ERROR);
    }

    #[test]
    fn test_assignable_forbids_narrowing() {
        assert!(assignable(&Type::REAL, &Type::INT));
        assert!(assignable(&Type::INT, &Type::INT));
        assert!(!assignable(&Type::INT, &Type::REAL));
        assert!(!assignable(&Type::INT, &Type::BOOL));
        assert!(!assignable(&Type::ERROR, &Type::ERROR));
    }

    #[test]
    fn test_indexed() {
        let matrix = Type::REAL
            .with_dims(vec![Period::new(1, 2), Period::new(0, 4)]);
        assert_eq!(
            matrix.indexed(1),
            Some(Type::REAL.with_dims(vec![Period::new(0, 4)]))
        );
        assert_eq!(matrix.indexed(2), Some(Type::REAL));
        assert_eq!(matrix.indexed(3), None);
    }

    #[test]
    fn test_display() {
        let array = Type::CHAR.with_dims(vec![Period::new(-2, 2)]);
        assert_eq!(array.to_string(), "array[-2..2] of char");
        assert_eq!(Type::BOOL.to_string(), "boolean");
    }
}
