//! Semantic analysis
//!
//! Resolves every identifier against a scoped symbol table and checks types:
//! - [`symbols`]: Scope arena, items and overload resolution
//! - [`types`]: [`Type`], [`max_type`] and assignment compatibility
//! - [`infer`]: Expression typing shared with lowering
//! - [`analyzer`]: The checking pass and the [`analyze()`] entry point
//! - [`builtins`]: `write`/`writeln`/`read`/`readln`
//!
//! Analysis runs only on a syntactically clean program and never stops early.

pub mod analyzer;
pub mod builtins;
pub mod errors;
pub mod infer;
pub mod symbols;
pub mod types;

pub use analyzer::{analyze, Analysis};
pub use builtins::Builtin;
pub use errors::{SemanticError, SemanticErrorKind};
pub use infer::TypeQuery;
pub use symbols::{ScopeId, SymbolTable};
pub use types::{max_type, BaseType, Type};
