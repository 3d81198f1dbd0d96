//! Expression tree to REST query string compiler
//!
//! This crate bundles:
//! - The host expression tree ([`expr`])
//! - The type-mapping collaborator and metadata cache ([`types`])
//! - The compiler that lowers predicates and projections to filter text
//!   ([`compiler`])
//! - Query-string assembly with percent encoding ([`UriQueryBuilder`])
//!
//! # Example
//!
//! ```
//! use restq::{ConventionMapping, Expression, HostType, Parameter, QueryCompiler};
//! use std::sync::Arc;
//!
//! let x = Parameter::new("x", HostType::named("Critter"));
//! let predicate = Expression::lambda(
//!     x.clone(),
//!     x.to_expr().member("Name", HostType::String).equal(Expression::constant("Bob")),
//! );
//!
//! let compiler = QueryCompiler::new(Arc::new(ConventionMapping::default()));
//! assert_eq!(compiler.compile_predicate(&predicate).unwrap(), "name eq 'Bob'");
//! ```

mod uri;

// Re-export all public APIs from internal crates
pub use restq_compiler as compiler;
pub use restq_diagnostics as diagnostics;
pub use restq_expr as expr;
pub use restq_types as types;

// Convenience re-exports
pub use restq_compiler::{
    CompileError, CompileResult, CompilerOptions, QueryCompiler, QueryNode, QueryParameters,
    RootMode, is_representable, print,
};
pub use restq_diagnostics::{Diagnostic, ErrorCode};
pub use restq_expr::{Expression, HostType, ObjectValue, Parameter, Value};
pub use restq_types::{ConventionMapping, MappingRegistry, MetadataCache, TypeMapping};
pub use uri::{UriQueryBuilder, encode_query_value};
