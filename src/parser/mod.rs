//! Pascal source parser
//!
//! This module transforms Pascal source text into the Source AST:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parser struct, recovery and the [`parse()`] entry point
//! - [`ast`]: Source AST node definitions
//!
//! # Supported Pascal Subset
//!
//! - Types: `integer`, `real`, `boolean`, `char`, multi-dimensional arrays
//! - Declarations: constants, variables, procedures and functions with
//!   value and `var` parameters (one level of nesting)
//! - Statements: assignment, call, compound, `if`, `for`, `while`, `exit`
//! - No records, sets, files, pointers or labels
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary
//! operators and panic-mode error recovery. The declaration, statement and
//! expression rules extend [`Parser`] from their own files.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;

pub use parse::{parse, ParseOutput, Parser, SyntaxError};
