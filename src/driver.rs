//! Compilation pipeline
//!
//! ```text
//! source → Lexer → Parser → Analyzer → lower → generate → C text
//! ```
//!
//! Each stage runs to completion before the next starts. Syntax errors stop
//! the pipeline before analysis; semantic errors stop it before lowering.
//! A lexical error or an internal error ends it at once.

use crate::codegen;
use crate::diagnostics::Diagnostic;
use crate::lowering::{self, InternalError};
use crate::parser::{self, lexer::LexError, lexer::Lexer};
use crate::semantic;
use log::{debug, info};
use std::path::PathBuf;
use thiserror::Error;

/// Knobs that change the generated code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub opt_level: u8,
}

impl CompileOptions {
    pub fn new(opt_level: u8) -> Self {
        Self { opt_level }
    }

    /// Constant folding is enabled from `-O1` up.
    pub fn fold_constants(&self) -> bool {
        self.opt_level >= 1
    }
}

/// Why a compilation produced no C
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lexical(#[from] LexError),

    #[error("compilation failed with {} error(s)", .0.len())]
    Diagnostics(Vec<Diagnostic>),

    #[error("internal compiler error: {0}")]
    Internal(#[from] InternalError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Compile Pascal `source` to C text.
pub fn compile(source: &str, options: &CompileOptions) -> Result<String, CompileError> {
    let tokens = Lexer::new(source).tokenize();
    debug!("lexed {} token(s)", tokens.len());

    let parsed = parser::parse(tokens)?;
    if !parsed.errors.is_empty() {
        info!("parsing reported {} error(s)", parsed.errors.len());
        return Err(CompileError::Diagnostics(Diagnostic::collect(
            parsed.errors,
            Vec::new(),
        )));
    }

    let analysis = semantic::analyze(&parsed.program);
    if !analysis.errors.is_empty() {
        return Err(CompileError::Diagnostics(Diagnostic::collect(
            Vec::new(),
            analysis.errors,
        )));
    }

    let target = lowering::lower(&parsed.program, &analysis.table, options)?;
    Ok(codegen::generate(&target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_threshold() {
        assert!(!CompileOptions::default().fold_constants());
        assert!(CompileOptions::new(1).fold_constants());
        assert!(CompileOptions::new(3).fold_constants());
    }

    #[test]
    fn test_syntax_errors_skip_analysis() {
        // `y` is undeclared, but the missing ':=' stops the run first
        let err = compile(
            "program p; var x: integer; begin x = 1; y := 2 end.",
            &CompileOptions::default(),
        )
        .unwrap_err();
        let CompileError::Diagnostics(diagnostics) = err else {
            panic!("expected diagnostics, got {:?}", err);
        };
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(diagnostics[0], Diagnostic::Syntax(_)));
    }

    #[test]
    fn test_lexical_error_is_fatal() {
        let err = compile("program p; begin x := 1 # end.", &CompileOptions::default())
            .unwrap_err();
        assert!(matches!(err, CompileError::Lexical(_)));
    }
}
