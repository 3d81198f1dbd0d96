//! Selector and projection compilation tests

mod common;

use common::{compiler, jalla, lambda, prop, select};
use pretty_assertions::assert_eq;
use restq::types::{TypeKind, TypeMetadata};
use restq::{Expression, HostType, MappingRegistry, QueryCompiler};
use std::sync::Arc;

#[test]
fn test_anonymous_projection_keeps_member_order() {
    let body = Expression::new_anonymous(
        "<>f__AnonymousType0",
        [
            ("Bar", prop("Bar", HostType::String)),
            ("Foo", jalla().call("ToUpper", vec![], HostType::String)),
        ],
    );
    insta::assert_snapshot!(select(body), @"bar as Bar,toupper(jalla) as Foo");
}

#[test]
fn test_tuple_projection() {
    let body = Expression::new_tuple(vec![jalla(), prop("Number", HostType::Int32)]);
    assert_eq!(select(body), "jalla as Item1,number as Item2");
}

#[test]
fn test_constructor_parameter_names() {
    let registry = MappingRegistry::new()
        .with_type(TypeMetadata::new("Pair", TypeKind::Anonymous).with_constructor(["Left", "Right"]));
    let compiler = QueryCompiler::new(Arc::new(registry));
    let body = Expression::new_object(
        HostType::anonymous("Pair"),
        vec![jalla(), prop("Number", HostType::Int32)],
    );
    assert_eq!(
        compiler.compile_selector(&lambda(body)).unwrap(),
        "jalla as Left,number as Right"
    );
}

#[test]
fn test_value_selector() {
    assert_eq!(select(jalla()), "jalla as this");
    assert_eq!(
        select(prop("Number", HostType::Int32).plus(Expression::constant(1))),
        "number add 1 as this"
    );
}

#[test]
fn test_list_selector() {
    let body = Expression::list(HostType::String, vec![jalla(), Expression::constant("lit")]);
    assert_eq!(select(body), "[jalla,'lit']");
}

#[test]
fn test_projection_with_unsupported_field_fails() {
    let body = Expression::new_anonymous(
        "<>f__AnonymousType1",
        [
            ("A", jalla()),
            ("B", jalla().call("Frobnicate", vec![], HostType::String)),
        ],
    );
    let err = compiler().compile_selector(&lambda(body)).unwrap_err();
    assert!(err.is_recoverable());
    assert!(err.to_string().contains("x.Jalla.Frobnicate()"));
}

#[test]
fn test_nested_record_is_unsupported() {
    let inner = Expression::new_anonymous("<>f__AnonymousType2", [("Inner", jalla())]);
    let body = Expression::new_anonymous("<>f__AnonymousType3", [("Outer", inner)]);
    assert!(compiler().compile_selector(&lambda(body)).is_err());
}
