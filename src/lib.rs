//! # Introduction
//!
//! pascal2c translates programs written in a Pascal subset into equivalent
//! C99 source text. Malformed input is reported with every recoverable
//! error found in one run, sorted by position.
//!
//! ## Compilation pipeline
//!
//! ```text
//! Source → Lexer → Parser → Source AST → Analyzer → lower → Target IR → C
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds the Source AST, recovering
//!    from syntax errors statement by statement.
//! 2. [`semantic`]: builds the scoped [`semantic::SymbolTable`] and checks
//!    types; runs only on a syntactically clean tree.
//! 3. [`lowering`]: resolves names, reference parameters and array bounds
//!    into the C-shaped [`lowering::TargetProgram`], folding constants at
//!    `-O1` and above; runs only when analysis found nothing.
//! 4. [`codegen`]: prints the Target IR as C text.
//! 5. [`diagnostics`]: sorting and rendering of syntax and semantic errors.
//!
//! [`compile()`] runs all of it.
//!
//! ## Supported Pascal subset
//!
//! Types: `integer`, `real`, `boolean`, `char`, multi-dimensional arrays.
//! Statements: assignment, call, `begin`/`end`, `if/else`, `for to/downto`,
//! `while`, `exit`.
//! Subprograms: one level of procedures and functions with value and `var`
//! parameters, overloadable by signature.
//! Built-ins: `write`, `writeln`, `read`, `readln`.

pub mod codegen;
pub mod diagnostics;
pub mod driver;
pub mod lowering;
pub mod parser;
pub mod semantic;

pub use diagnostics::Diagnostic;
pub use driver::{compile, CompileError, CompileOptions};
