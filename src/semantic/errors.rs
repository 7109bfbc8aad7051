//! Semantic error types
//!
//! This module defines [`SemanticError`], the recoverable errors found while
//! resolving names and checking types. None of them stop analysis; the
//! analyzer records each one and moves on to the next node.

use crate::parser::ast::SourceLocation;
use std::fmt;
use thiserror::Error;

/// Semantic errors, one variant per category
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    /// Identifier unknown in every enclosing scope
    #[error("'{name}' is not declared")]
    NotFound {
        name: String,
        location: SourceLocation,
    },

    /// No overload accepts the actual arguments
    #[error("no declaration of '{name}' accepts ({arguments})")]
    ParameterMismatch {
        name: String,
        arguments: String,
        location: SourceLocation,
    },

    /// Operand or assignment types do not unify
    #[error("{message}")]
    TypeMismatch {
        message: String,
        location: SourceLocation,
    },

    /// Called identifier is not a procedure or function
    #[error("'{name}' is not a procedure or function")]
    NotAFunction {
        name: String,
        location: SourceLocation,
    },

    /// Name and signature already declared in the same scope
    #[error("'{name}' is already declared in this scope")]
    DuplicateDeclaration {
        name: String,
        location: SourceLocation,
    },
}

/// Category of a [`SemanticError`], for filtering and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticErrorKind {
    NotFound,
    ParameterMismatch,
    TypeMismatch,
    NotAFunction,
    DuplicateDeclaration,
}

impl fmt::Display for SemanticErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SemanticErrorKind::NotFound => "name",
            SemanticErrorKind::ParameterMismatch => "parameter",
            SemanticErrorKind::TypeMismatch => "type",
            SemanticErrorKind::NotAFunction => "call",
            SemanticErrorKind::DuplicateDeclaration => "declaration",
        };
        write!(f, "{}", name)
    }
}

impl SemanticError {
    pub fn type_mismatch(
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        SemanticError::TypeMismatch {
            message: message.into(),
            location,
        }
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            SemanticError::NotFound { location, .. }
            | SemanticError::ParameterMismatch { location, .. }
            | SemanticError::TypeMismatch { location, .. }
            | SemanticError::NotAFunction { location, .. }
            | SemanticError::DuplicateDeclaration { location, .. } => *location,
        }
    }

    pub fn kind(&self) -> SemanticErrorKind {
        match self {
            SemanticError::NotFound { .. } => SemanticErrorKind::NotFound,
            SemanticError::ParameterMismatch { .. } => {
                SemanticErrorKind::ParameterMismatch
            }
            SemanticError::TypeMismatch { .. } => SemanticErrorKind::TypeMismatch,
            SemanticError::NotAFunction { .. } => SemanticErrorKind::NotAFunction,
            SemanticError::DuplicateDeclaration { .. } => {
                SemanticErrorKind::DuplicateDeclaration
            }
        }
    }
}
