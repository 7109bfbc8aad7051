//! C code generation from the Target IR

pub mod emit;

pub use emit::generate;
