//! Lowering to the Target IR
//!
//! - [`ir`]: The C-shaped Target IR
//! - [`fold`]: Pure constant folding over the Source AST
//! - [`transform`]: [`lower()`], resolving names, references and bounds
//!   against the finished symbol table

pub mod fold;
pub mod ir;
pub mod transform;

pub use fold::fold;
pub use ir::TargetProgram;
pub use transform::{lower, InternalError};
