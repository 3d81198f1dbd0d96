//! Host expression tree definitions
//!
//! This crate defines the typed expression tree a host application builds to
//! describe a predicate or projection over a resource type. The query compiler
//! consumes these trees; it never inspects host runtime types directly, only the
//! [`HostType`] descriptors attached to each node.

mod display;
mod expression;
mod operator;
mod types;
mod value;

pub use expression::*;
pub use operator::*;
pub use types::*;
pub use value::*;

/// Type alias for boxed expressions
pub type BoxExpr = Box<Expression>;
