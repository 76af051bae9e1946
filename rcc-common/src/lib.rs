//! Ripple C99 Compiler - Common Types and Utilities
//!
//! Types shared between the compiler crates.

pub mod position;

pub use position::{Position, SourceLocation};
