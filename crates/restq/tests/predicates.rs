//! Predicate compilation tests
//!
//! Each case compiles a predicate lambda over `TestResource` and compares
//! the filter text.

mod common;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use common::{filter, jalla, prop, x};
use pretty_assertions::assert_eq;
use restq::expr::{DateTimeValue, HostFunction};
use restq::{Expression, HostType, ObjectValue, Value};
use rstest::rstest;
use rust_decimal::Decimal;
use uuid::Uuid;

fn text(value: &str) -> Expression {
    Expression::constant(value)
}

fn moment() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2012, 10, 22)
        .and_then(|d| d.and_hms_opt(5, 32, 45))
        .unwrap()
}

// === Comparisons and literals ===

#[test]
fn test_string_equality() {
    insta::assert_snapshot!(filter(jalla().equal(text("What"))), @"jalla eq 'What'");
}

#[test]
fn test_not_equal() {
    assert_eq!(filter(jalla().not_equal(text("What"))), "jalla ne 'What'");
}

#[rstest]
#[case::inner("Banana'Boo", "jalla eq 'Banana''Boo'")]
#[case::lone("'", "jalla eq ''''")]
#[case::pair("''", "jalla eq ''''''")]
fn test_quote_is_doubled(#[case] value: &str, #[case] expected: &str) {
    assert_eq!(filter(jalla().equal(text(value))), expected);
}

#[test]
fn test_null_comparison() {
    assert_eq!(
        filter(jalla().equal(Expression::null(HostType::String))),
        "jalla eq null"
    );
}

#[test]
fn test_boolean_roots() {
    assert_eq!(filter(Expression::constant(true)), "true");
    assert_eq!(filter(Expression::constant(false)), "false");
    assert_eq!(filter(prop("Flag", HostType::Boolean)), "flag");
}

#[test]
fn test_numeric_literals() {
    assert_eq!(
        filter(prop("Price", HostType::Single).equal(Expression::constant(10.75f32))),
        "price eq 10.75f"
    );
    assert_eq!(
        filter(prop("Cash", HostType::Decimal).equal(Expression::constant(Decimal::new(10010, 2)))),
        "cash eq 100.10m"
    );
    assert_eq!(
        filter(prop("Ratio", HostType::Double).equal(Expression::constant(10.25f64))),
        "ratio eq 10.25"
    );
    assert_eq!(
        filter(prop("Big", HostType::Int64).equal(Expression::constant(5i64))),
        "big eq 5L"
    );
}

#[test]
fn test_datetime_literals() {
    let birthday = || prop("Birthday", HostType::DateTime);
    assert_eq!(
        filter(birthday().equal(Expression::constant(DateTimeValue::Utc(moment())))),
        "birthday eq datetime'2012-10-22T05:32:45Z'"
    );
    assert_eq!(
        filter(birthday().equal(Expression::constant(DateTimeValue::Local(moment())))),
        "birthday eq datetime'2012-10-22T05:32:45'"
    );

    let stamp = FixedOffset::east_opt(2 * 3600)
        .and_then(|zone| zone.from_local_datetime(&moment()).single())
        .unwrap();
    assert_eq!(
        filter(
            prop("Stamp", HostType::DateTimeOffset)
                .equal(Expression::constant(DateTimeValue::Offset(stamp)))
        ),
        "stamp eq datetime'2012-10-22T05:32:45+02:00'"
    );
}

#[test]
fn test_guid_literal() {
    let guid = Uuid::parse_str("6dd20569-1c36-4f07-8a16-5c1e2f6b6e3a").unwrap();
    assert_eq!(
        filter(prop("Guid", HostType::Guid).equal(Expression::constant(guid))),
        "guid eq guid'6dd20569-1c36-4f07-8a16-5c1e2f6b6e3a'"
    );
}

// === Operators ===

#[test]
fn test_ordering_and_logic() {
    let number = || prop("Number", HostType::Int32);
    let body = number()
        .greater(Expression::constant(1))
        .and_also(number().less_or_equal(Expression::constant(10)))
        .or_else(jalla().equal(text("x")));
    assert_eq!(filter(body), "number gt 1 and number le 10 or jalla eq 'x'");
}

#[test]
fn test_or_under_and_keeps_parentheses() {
    let body = jalla()
        .equal(text("a"))
        .or_else(jalla().equal(text("b")))
        .and_also(prop("Flag", HostType::Boolean));
    assert_eq!(filter(body), "(jalla eq 'a' or jalla eq 'b') and flag");
}

#[test]
fn test_not() {
    assert_eq!(
        filter(jalla().equal(text("a")).logical_not()),
        "not (jalla eq 'a')"
    );
}

#[test]
fn test_arithmetic() {
    let body = prop("Number", HostType::Int32)
        .plus(Expression::constant(2))
        .times(Expression::constant(3))
        .equal(Expression::constant(12));
    assert_eq!(filter(body), "(number add 2) mul 3 eq 12");
}

#[test]
fn test_string_plus_becomes_concat() {
    let body = jalla().plus(text("!")).equal(text("Hi!"));
    assert_eq!(filter(body), "concat(jalla,'!') eq 'Hi!'");
}

// === Functions ===

#[test]
fn test_string_functions() {
    let call = |name: &str, args: Vec<Expression>, ty: HostType| jalla().call(name, args, ty);

    assert_eq!(
        filter(call("Contains", vec![text("cool")], HostType::Boolean)),
        "substringof('cool',jalla)"
    );
    assert_eq!(
        filter(call("StartsWith", vec![text("Gangnam")], HostType::Boolean)),
        "startswith(jalla,'Gangnam')"
    );
    assert_eq!(
        filter(call("EndsWith", vec![text("boja")], HostType::Boolean)),
        "endswith(jalla,'boja')"
    );
    assert_eq!(
        filter(call("IndexOf", vec![Expression::constant('z')], HostType::Int32).equal(Expression::constant(2))),
        "indexof(jalla,'z') eq 2"
    );
    assert_eq!(
        filter(
            call(
                "Substring",
                vec![Expression::constant(1), Expression::constant(2)],
                HostType::String
            )
            .equal(text("al"))
        ),
        "substring(jalla,1,2) eq 'al'"
    );
    assert_eq!(
        filter(call("Substring", vec![Expression::constant(3)], HostType::String).equal(text("la"))),
        "substring(jalla,3) eq 'la'"
    );
    assert_eq!(
        filter(call("Replace", vec![text("a"), text("e")], HostType::String).equal(text("jelle"))),
        "replace(jalla,'a','e') eq 'jelle'"
    );
    assert_eq!(
        filter(call("ToLower", vec![], HostType::String).equal(text("jalla"))),
        "tolower(jalla) eq 'jalla'"
    );
}

#[test]
fn test_property_functions() {
    assert_eq!(
        filter(jalla().member("Length", HostType::Int32).equal(Expression::constant(5))),
        "length(jalla) eq 5"
    );
    assert_eq!(
        filter(
            prop("SomeList", HostType::list(HostType::String))
                .member("Count", HostType::Int32)
                .equal(Expression::constant(4))
        ),
        "count(someList) eq 4"
    );
    assert_eq!(
        filter(
            prop("Birthday", HostType::DateTime)
                .member("Year", HostType::Int32)
                .equal(Expression::constant(2012))
        ),
        "year(birthday) eq 2012"
    );
}

#[rstest]
#[case::month("Month", 10, "month(birthday) eq 10")]
#[case::day("Day", 22, "day(birthday) eq 22")]
#[case::hour("Hour", 5, "hour(birthday) eq 5")]
#[case::minute("Minute", 32, "minute(birthday) eq 32")]
#[case::second("Second", 45, "second(birthday) eq 45")]
fn test_date_part_functions(#[case] part: &str, #[case] value: i32, #[case] expected: &str) {
    let body = prop("Birthday", HostType::DateTime)
        .member(part, HostType::Int32)
        .equal(Expression::constant(value));
    assert_eq!(filter(body), expected);
}

#[rstest]
#[case::round("Round", "round(ratio) eq 3.0")]
#[case::floor("Floor", "floor(ratio) eq 3.0")]
#[case::ceiling("Ceiling", "ceiling(ratio) eq 3.0")]
fn test_math_functions(#[case] method: &str, #[case] expected: &str) {
    let body = Expression::static_call(
        HostType::named("Math"),
        method,
        vec![prop("Ratio", HostType::Double)],
        HostType::Double,
    )
    .equal(Expression::constant(3.0f64));
    assert_eq!(filter(body), expected);
}

#[test]
fn test_static_concat() {
    let body = Expression::static_call(HostType::String, "Concat", vec![jalla(), text("x")], HostType::String)
        .equal(text("ax"));
    assert_eq!(filter(body), "concat(jalla,'x') eq 'ax'");
}

// === Paths ===

#[test]
fn test_nested_member_path() {
    let body = prop("Inner", HostType::named("Inner"))
        .member("CashAmount", HostType::Decimal)
        .equal(Expression::constant(Decimal::new(5, 0)));
    assert_eq!(filter(body), "inner.cashAmount eq 5m");
}

#[test]
fn test_dictionary_index_is_path_segment() {
    let body = prop(
        "StringToStringDict",
        HostType::dictionary(HostType::String, HostType::String),
    )
    .index(text("noob"), HostType::String)
    .equal(text("bob"));
    assert_eq!(filter(body), "stringToStringDict.noob eq 'bob'");
}

#[test]
fn test_nullable_value_unwraps() {
    let body = prop("Maybe", HostType::nullable(HostType::Int32))
        .member("Value", HostType::Int32)
        .equal(Expression::constant(5));
    assert_eq!(filter(body), "maybe eq 5");
}

#[test]
fn test_nullable_has_value_is_null_test() {
    let maybe = || prop("Maybe", HostType::nullable(HostType::Int32));
    assert_eq!(
        filter(maybe().member("HasValue", HostType::Boolean)),
        "maybe ne null"
    );
    assert_eq!(
        filter(
            maybe()
                .member("HasValue", HostType::Boolean)
                .and_also(maybe().member("Value", HostType::Int32).greater(Expression::constant(5)))
        ),
        "maybe ne null and maybe gt 5"
    );
}

// === Constant folding ===

#[test]
fn test_closure_member_folds() {
    let captured = Expression::closure(ObjectValue::new("Closure").with_field("Junk", "Kirk"))
        .member("Junk", HostType::String);
    insta::assert_snapshot!(filter(jalla().equal(captured)), @"jalla eq 'Kirk'");
}

#[test]
fn test_parameter_free_arithmetic_folds() {
    let captured = Expression::closure(ObjectValue::new("Closure").with_field("Count", 40))
        .member("Count", HostType::Int32)
        .plus(Expression::constant(2));
    assert_eq!(
        filter(prop("Number", HostType::Int32).equal(captured)),
        "number eq 42"
    );
}

#[test]
fn test_host_function_folds() {
    let shout = HostFunction::new(|args| match args {
        [Value::String(s)] => Ok(Value::String(s.to_uppercase())),
        _ => Err("expected a string".to_string()),
    });
    let folded = text("kirk").call_host("Shout", vec![], HostType::String, shout);
    assert_eq!(filter(jalla().equal(folded)), "jalla eq 'KIRK'");
}

#[test]
fn test_builtin_string_method_folds() {
    let folded = text("  Kirk ").call("Trim", vec![], HostType::String);
    assert_eq!(filter(jalla().equal(folded)), "jalla eq 'Kirk'");
}

#[test]
fn test_parameter_name_does_not_leak() {
    let text = filter(x().to_expr().member("Jalla", HostType::String).equal(Expression::constant("x")));
    assert!(!text.contains("x."));
}
