//! Query chain translation and URI assembly

mod common;

use common::{compiler, jalla, lambda, prop, resource};
use pretty_assertions::assert_eq;
use restq::diagnostics::{RQ0201, RQ0202};
use restq::{Expression, HostType, QueryParameters, UriQueryBuilder};

fn source() -> Expression {
    Expression::query_source(resource())
}

fn translate(query: &Expression) -> QueryParameters {
    match compiler().translate_query(query) {
        Ok(params) => params,
        Err(err) => panic!("Failed to translate query: {}", err),
    }
}

fn uri(params: &QueryParameters) -> String {
    let mut builder = UriQueryBuilder::new();
    builder.append_query(params);
    builder.build()
}

#[test]
fn test_filter_order_and_paging() {
    let query = source()
        .query_op("Where", vec![lambda(jalla().equal(Expression::constant("What")))])
        .query_op("OrderBy", vec![lambda(prop("Number", HostType::Int32))])
        .query_op("Skip", vec![Expression::constant(20)])
        .query_op("Take", vec![Expression::constant(10)]);

    insta::assert_snapshot!(
        uri(&translate(&query)),
        @"$filter=jalla+eq+'What'&$orderby=number&$top=10&$skip=20"
    );
}

#[test]
fn test_select_projection() {
    let projection = Expression::new_anonymous(
        "<>f__AnonymousType0",
        [("Name", jalla()), ("N", prop("Number", HostType::Int32))],
    );
    let query = source()
        .query_op("Where", vec![lambda(prop("Flag", HostType::Boolean))])
        .query_op("Select", vec![lambda(projection)]);

    let params = translate(&query);
    assert_eq!(params.filter.as_deref(), Some("flag"));
    assert_eq!(params.select.as_deref(), Some("jalla as Name,number as N"));
    assert_eq!(uri(&params), "$filter=flag&$select=jalla+as+Name%2Cnumber+as+N");
}

#[test]
fn test_select_many_then_filter_child() {
    let child = HostType::named("Child");
    let children = lambda(prop("Children", HostType::list(child.clone())));
    let c = restq::Parameter::new("c", child.clone());
    let child_filter = Expression::lambda(
        c.clone(),
        c.to_expr().member("Age", HostType::Int32).greater(Expression::constant(3)),
    );

    let query = source()
        .query_op("SelectMany", vec![children])
        .query_op("Where", vec![child_filter]);
    let params = translate(&query);
    assert_eq!(params.select_many.as_deref(), Some("children"));
    assert_eq!(params.filter.as_deref(), Some("age gt 3"));
}

#[test]
fn test_expand_and_total_count() {
    let query = source()
        .query_op("Expand", vec![lambda(prop("Friend", HostType::named("TestResource")))])
        .query_op("IncludeTotalCount", vec![]);
    assert_eq!(uri(&translate(&query)), "$expand=friend&$totalcount=true");
}

#[test]
fn test_operator_after_select_is_rejected() {
    let query = source()
        .query_op("Select", vec![lambda(jalla())])
        .query_op("Where", vec![lambda(prop("Flag", HostType::Boolean))]);
    let err = compiler().translate_query(&query).unwrap_err();
    assert_eq!(err.code(), RQ0201);
    assert!(!err.is_recoverable());
}

#[test]
fn test_chain_without_source_is_rejected() {
    let err = compiler().translate_query(&jalla()).unwrap_err();
    assert_eq!(err.code(), RQ0202);
}

#[test]
fn test_unsupported_filter_is_recoverable() {
    let query = source().query_op(
        "Where",
        vec![lambda(jalla().call("Frobnicate", vec![], HostType::Boolean))],
    );
    let err = compiler().translate_query(&query).unwrap_err();
    assert!(err.is_recoverable());
}

#[test]
fn test_expression_parameter_requires_representable_tree() {
    let compiler = compiler();
    let good = compiler
        .rewrite_predicate(&lambda(jalla().equal(Expression::constant("a b"))), None)
        .unwrap();
    let bad = compiler
        .rewrite_predicate(
            &lambda(jalla().call("Frobnicate", vec![], HostType::Boolean)),
            None,
        )
        .unwrap();

    let mut builder = UriQueryBuilder::new();
    builder.append_expression_parameter("$filter", &good).unwrap();
    assert!(builder.append_expression_parameter("$filter", &bad).is_err());
    assert_eq!(builder.as_str(), "$filter=jalla+eq+'a+b'");
}

#[test]
fn test_parameters_round_trip_through_json() {
    let query = source()
        .query_op("Where", vec![lambda(prop("Flag", HostType::Boolean))])
        .query_op("Take", vec![Expression::constant(3)]);
    let params = translate(&query);
    let json = serde_json::to_string(&params).unwrap();
    let back: QueryParameters = serde_json::from_str(&json).unwrap();
    assert_eq!(back, params);
}
