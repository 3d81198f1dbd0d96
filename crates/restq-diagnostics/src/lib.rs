//! restq diagnostics
//!
//! This crate provides the error code registry and diagnostic reporting types
//! shared by the query compiler crates.

mod diagnostic;
mod error_code;

pub use diagnostic::*;
pub use error_code::*;
