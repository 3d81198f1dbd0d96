//! Expression tree to query string compiler
//!
//! This crate lowers a typed host expression tree (a predicate or projection
//! lambda) into the canonical textual filter grammar:
//! - [`classify`]: maps host nodes onto the closed set of query node kinds
//! - [`rewrite`]: builds the intermediate [`QueryNode`] tree, folding
//!   closed-over values into literals
//! - [`projection`]: builds named-field select lists
//! - [`printer`]: serializes a representable tree
//! - [`tracker`]: finds the nodes that have no representation
//! - [`chain`]: translates whole query chains into query parameters

pub mod chain;
pub mod classify;
pub mod compiler;
pub mod error;
pub mod fold;
pub mod functions;
pub mod literal;
pub mod options;
pub mod printer;
pub mod projection;
pub mod query;
pub mod rewrite;
pub mod tracker;

pub use chain::{OrderByItem, QueryParameters};
pub use classify::{Classifier, NodeKind};
pub use compiler::QueryCompiler;
pub use error::{CompileError, CompileResult, EvalError, LiteralError, UnsupportedCause};
pub use functions::{Function, FunctionSignature};
pub use literal::format_literal;
pub use options::CompilerOptions;
pub use printer::print;
pub use query::{
    ArithmeticOp, ComparisonOp, LogicalOp, MemberPath, QueryKind, QueryNode, UnsupportedNode,
};
pub use rewrite::{RootMode, Rewriter};
pub use tracker::{collect, ensure_representable, is_representable};
