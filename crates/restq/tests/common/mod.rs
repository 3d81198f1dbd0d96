//! Shared fixtures for integration tests

#![allow(dead_code)]

use restq::{ConventionMapping, Expression, HostType, Parameter, QueryCompiler};
use std::sync::Arc;

pub fn resource() -> HostType {
    HostType::named("TestResource")
}

/// The lambda parameter every fixture predicate is written against
pub fn x() -> Parameter {
    Parameter::new("x", resource())
}

/// `x.<name>` typed as `ty`
pub fn prop(name: &str, ty: HostType) -> Expression {
    x().to_expr().member(name, ty)
}

pub fn jalla() -> Expression {
    prop("Jalla", HostType::String)
}

pub fn lambda(body: Expression) -> Expression {
    Expression::lambda(x(), body)
}

pub fn compiler() -> QueryCompiler {
    QueryCompiler::new(Arc::new(ConventionMapping::default()))
}

/// Compile a predicate body written against `x`
pub fn filter(body: Expression) -> String {
    match compiler().compile_predicate(&lambda(body)) {
        Ok(text) => text,
        Err(err) => panic!("Failed to compile predicate: {}", err),
    }
}

/// Compile a selector body written against `x`
pub fn select(body: Expression) -> String {
    match compiler().compile_selector(&lambda(body)) {
        Ok(text) => text,
        Err(err) => panic!("Failed to compile selector: {}", err),
    }
}
