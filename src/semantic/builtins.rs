//! Built-in I/O procedures
//!
//! `write`, `writeln`, `read` and `readln` take any number of arguments, so
//! they bypass signature lookup. A user declaration with the same name hides
//! the built-in.
//!
//! # Argument rules
//!
//! - `write`/`writeln`: scalar values or string literals
//! - `read`/`readln`: scalar variables only

use crate::parser::ast::{Expr, SourceLocation};
use crate::semantic::analyzer::{Analyzer, Context};
use crate::semantic::errors::SemanticError;
use crate::semantic::infer::TypeQuery;
use crate::semantic::types::BaseType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Write,
    Writeln,
    Read,
    Readln,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "write" => Some(Builtin::Write),
            "writeln" => Some(Builtin::Writeln),
            "read" => Some(Builtin::Read),
            "readln" => Some(Builtin::Readln),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Write => "write",
            Builtin::Writeln => "writeln",
            Builtin::Read => "read",
            Builtin::Readln => "readln",
        }
    }

    pub fn is_output(self) -> bool {
        matches!(self, Builtin::Write | Builtin::Writeln)
    }

    pub fn appends_newline(self) -> bool {
        self == Builtin::Writeln
    }
}

impl Analyzer {
    pub(crate) fn check_builtin_call(
        &mut self,
        builtin: Builtin,
        args: &[Expr],
        location: SourceLocation,
        ctx: Context<'_>,
    ) {
        log::trace!("checking built-in '{}' at {}", builtin.name(), location);

        for arg in args {
            let ty = self.type_of(arg, ctx.scope);
            if ty.is_error() {
                continue;
            }

            if builtin.is_output() {
                if !ty.is_scalar() || ty.base == BaseType::Void {
                    self.errors.push(SemanticError::type_mismatch(
                        format!("cannot write a value of type {}", ty),
                        arg.location(),
                    ));
                }
                continue;
            }

            if !TypeQuery::new(&self.table).is_variable(arg, ctx.scope) {
                self.errors.push(SemanticError::ParameterMismatch {
                    name: builtin.name().to_string(),
                    arguments: arg.to_string(),
                    location: arg.location(),
                });
            } else if !ty.is_scalar() {
                self.errors.push(SemanticError::type_mismatch(
                    format!("cannot read into a value of type {}", ty),
                    arg.location(),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Builtin::from_name("writeln"), Some(Builtin::Writeln));
        assert_eq!(Builtin::from_name("printf"), None);
        assert!(Builtin::Writeln.appends_newline());
        assert!(!Builtin::Readln.is_output());
    }
}
