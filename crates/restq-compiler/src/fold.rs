//! Constant folding
//!
//! Evaluates sub-expressions with no dependency on the lambda parameter
//! (typically member chains on a captured closure object) to a single value.
//! Evaluation is strict about overflow and division by zero; every failure is
//! returned as an [`EvalError`] for the rewriter to record on a marker.

use crate::EvalError;
use restq_expr::{
    BinaryExpr, BinaryOp, DateTimeValue, Expression, HostType, MemberAccess, MethodCall, UnaryOp,
    Value,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use std::cmp::Ordering;

/// Result type for constant evaluation
pub type EvalResult<T> = Result<T, EvalError>;

/// Nesting allowed by [`evaluate`]
pub const DEFAULT_EVAL_DEPTH: usize = 256;

/// Evaluate a parameter-free expression to a value
pub fn evaluate(expr: &Expression) -> EvalResult<Value> {
    evaluate_within(expr, DEFAULT_EVAL_DEPTH)
}

/// Evaluate with at most `max_depth` levels of nesting below `expr`
pub fn evaluate_within(expr: &Expression, max_depth: usize) -> EvalResult<Value> {
    eval(expr, max_depth.saturating_add(1))
}

fn eval(expr: &Expression, budget: usize) -> EvalResult<Value> {
    let Some(budget) = budget.checked_sub(1) else {
        return Err(EvalError::DepthExceeded);
    };
    match expr {
        Expression::Constant(c) => Ok(c.value.clone()),
        Expression::Member(m) => eval_member(m, budget),
        Expression::Unary(u) => {
            let operand = eval(&u.operand, budget)?;
            match u.op {
                UnaryOp::Not => match operand {
                    Value::Null => Ok(Value::Null),
                    Value::Boolean(b) => Ok(Value::Boolean(!b)),
                    other => Err(type_mismatch("Not", &[&other])),
                },
                UnaryOp::Negate => negate(operand, &u.ty),
                UnaryOp::Convert => convert(operand, &u.ty),
            }
        }
        Expression::Binary(b) => eval_binary(b, budget),
        Expression::Call(c) => eval_call(c, budget),
        Expression::Index(i) => {
            let target = eval(&i.target, budget)?;
            let [key] = i.args.as_slice() else {
                return Err(not_evaluable(expr));
            };
            index(target, eval(key, budget)?)
        }
        Expression::ListInit(l) => {
            let items = l.elements.iter().map(|e| eval(e, budget)).collect::<EvalResult<Vec<_>>>()?;
            Ok(Value::list(items))
        }
        Expression::Conditional(c) => match eval(&c.test, budget)? {
            Value::Boolean(true) => eval(&c.if_true, budget),
            Value::Boolean(false) => eval(&c.if_false, budget),
            other => Err(type_mismatch("?:", &[&other])),
        },
        Expression::Lambda(_)
        | Expression::Parameter(_)
        | Expression::New(_)
        | Expression::QuerySource(_) => Err(not_evaluable(expr)),
    }
}

fn not_evaluable(expr: &Expression) -> EvalError {
    EvalError::NotEvaluable {
        expression: expr.to_string(),
    }
}

fn type_mismatch(operator: &str, operands: &[&Value]) -> EvalError {
    let names: Vec<String> = operands.iter().map(|v| v.host_type().type_name()).collect();
    EvalError::TypeMismatch {
        operator: operator.to_string(),
        operands: names.join(", "),
    }
}

fn overflow(operation: &str) -> EvalError {
    EvalError::Overflow {
        operation: operation.to_string(),
    }
}

// ============================================================================
// Members and indexers
// ============================================================================

fn eval_member(m: &MemberAccess, budget: usize) -> EvalResult<Value> {
    let Some(target) = &m.target else {
        return Err(EvalError::NotEvaluable {
            expression: format!("{}.{}", m.declaring_type, m.name),
        });
    };
    let target = eval(target, budget)?;
    let missing = |value: &Value| EvalError::MissingMember {
        type_name: value.host_type().type_name(),
        member: m.name.clone(),
    };

    match (&target, m.name.as_str()) {
        (_, "HasValue") if matches!(m.declaring_type, HostType::Nullable(_)) => {
            Ok(Value::Boolean(!target.is_null()))
        }
        (Value::Null, _) => Err(EvalError::NullReference {
            member: m.name.clone(),
        }),
        (_, "Value") if matches!(m.declaring_type, HostType::Nullable(_)) => Ok(target.clone()),
        (Value::Object(obj), name) => obj.field(name).cloned().ok_or_else(|| missing(&target)),
        (Value::String(s), "Length") => count_value(s.chars().count()),
        (Value::List(items), "Count") => count_value(items.len()),
        (Value::Dictionary(entries), "Count") => count_value(entries.len()),
        (Value::DateTime(dt), name) => date_component(dt, name).ok_or_else(|| missing(&target)),
        _ => Err(missing(&target)),
    }
}

fn count_value(n: usize) -> EvalResult<Value> {
    i32::try_from(n)
        .map(Value::Int32)
        .map_err(|_| overflow("Count"))
}

fn date_component(dt: &DateTimeValue, name: &str) -> Option<Value> {
    let component = match name {
        "Year" => dt.year(),
        "Month" => dt.month() as i32,
        "Day" => dt.day() as i32,
        "Hour" => dt.hour() as i32,
        "Minute" => dt.minute() as i32,
        "Second" => dt.second() as i32,
        _ => return None,
    };
    Some(Value::Int32(component))
}

fn index(target: Value, key: Value) -> EvalResult<Value> {
    match (&target, &key) {
        (Value::Null, _) => Err(EvalError::NullReference {
            member: "[]".to_string(),
        }),
        (Value::Dictionary(entries), Value::String(k)) => entries
            .get(k)
            .cloned()
            .ok_or_else(|| EvalError::KeyNotFound { key: k.clone() }),
        (Value::List(items), _) => {
            let Some(i) = key.as_i64() else {
                return Err(type_mismatch("[]", &[&target, &key]));
            };
            usize::try_from(i)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or(EvalError::IndexOutOfRange {
                    index: i,
                    length: items.len(),
                })
        }
        _ => Err(type_mismatch("[]", &[&target, &key])),
    }
}

// ============================================================================
// Numeric helpers
// ============================================================================

/// Numeric operand widened for computation
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
    Dec(Decimal),
}

fn numeric(value: &Value) -> Option<Num> {
    match value {
        Value::Single(v) => Some(Num::Float(f64::from(*v))),
        Value::Double(v) => Some(Num::Float(*v)),
        Value::Decimal(v) => Some(Num::Dec(*v)),
        other => other.as_i64().map(Num::Int),
    }
}

/// Bring two operands to a common representation: decimal wins over
/// floating point, which wins over integers
fn promote(a: Num, b: Num) -> Option<(Num, Num)> {
    match (a, b) {
        (Num::Int(_), Num::Int(_)) | (Num::Float(_), Num::Float(_)) | (Num::Dec(_), Num::Dec(_)) => {
            Some((a, b))
        }
        (Num::Dec(_), _) | (_, Num::Dec(_)) => Some((Num::Dec(to_decimal(a)?), Num::Dec(to_decimal(b)?))),
        _ => Some((Num::Float(to_float(a)), Num::Float(to_float(b)))),
    }
}

fn to_decimal(n: Num) -> Option<Decimal> {
    match n {
        Num::Int(v) => Some(Decimal::from(v)),
        Num::Float(v) => Decimal::from_f64(v),
        Num::Dec(v) => Some(v),
    }
}

fn to_float(n: Num) -> f64 {
    match n {
        Num::Int(v) => v as f64,
        Num::Float(v) => v,
        Num::Dec(v) => v.to_f64().unwrap_or(f64::NAN),
    }
}

/// Store an integer result in the declared integral type
fn integer_value(v: i64, ty: &HostType, operation: &str) -> EvalResult<Value> {
    let value = match ty.underlying() {
        HostType::Byte => Value::Byte(u8::try_from(v).map_err(|_| overflow(operation))?),
        HostType::Int16 => Value::Int16(i16::try_from(v).map_err(|_| overflow(operation))?),
        HostType::Int64 => Value::Int64(v),
        HostType::Single => Value::Single(v as f32),
        HostType::Double => Value::Double(v as f64),
        HostType::Decimal => Value::Decimal(Decimal::from(v)),
        _ => Value::Int32(i32::try_from(v).map_err(|_| overflow(operation))?),
    };
    Ok(value)
}

fn float_value(v: f64, ty: &HostType) -> Value {
    match ty.underlying() {
        HostType::Single => Value::Single(v as f32),
        _ => Value::Double(v),
    }
}

fn negate(operand: Value, ty: &HostType) -> EvalResult<Value> {
    match numeric(&operand) {
        _ if operand.is_null() => Ok(Value::Null),
        Some(Num::Int(v)) => integer_value(v.checked_neg().ok_or_else(|| overflow("Negate"))?, ty, "Negate"),
        Some(Num::Float(v)) => Ok(float_value(-v, ty)),
        Some(Num::Dec(v)) => Ok(Value::Decimal(-v)),
        None => Err(type_mismatch("Negate", &[&operand])),
    }
}

fn convert(value: Value, ty: &HostType) -> EvalResult<Value> {
    if value.is_null() {
        return if ty.is_nullable() {
            Ok(Value::Null)
        } else {
            Err(EvalError::InvalidConversion {
                from: "null".to_string(),
                to: ty.type_name(),
            })
        };
    }

    let target = ty.underlying();
    if matches!(target, HostType::Object) || value.host_type() == *target {
        return Ok(value);
    }

    let invalid = |value: &Value| EvalError::InvalidConversion {
        from: value.host_type().type_name(),
        to: ty.type_name(),
    };
    let Some(n) = numeric(&value) else {
        return match (&value, target) {
            (Value::Char(c), t) if t.is_integer() => integer_value(i64::from(u32::from(*c)), t, "Convert"),
            _ => Err(invalid(&value)),
        };
    };

    match target {
        HostType::Byte | HostType::Int16 | HostType::Int32 | HostType::Int64 => {
            let whole = match n {
                Num::Int(v) => Some(v),
                Num::Float(v) => {
                    let truncated = v.trunc();
                    (truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64)
                        .then_some(truncated as i64)
                }
                Num::Dec(v) => v.trunc().to_i64(),
            };
            integer_value(whole.ok_or_else(|| overflow("Convert"))?, target, "Convert")
        }
        HostType::Single | HostType::Double => Ok(float_value(to_float(n), target)),
        HostType::Decimal => to_decimal(n)
            .map(Value::Decimal)
            .ok_or_else(|| invalid(&value)),
        _ => Err(invalid(&value)),
    }
}

// ============================================================================
// Binary operators
// ============================================================================

fn eval_binary(b: &BinaryExpr, budget: usize) -> EvalResult<Value> {
    if b.op.is_logical() {
        return eval_logical(b, budget);
    }

    let left = eval(&b.left, budget)?;
    let right = eval(&b.right, budget)?;

    if b.op.is_equality() {
        let equal = values_equal(&left, &right);
        return Ok(Value::Boolean(if b.op == BinaryOp::Equal { equal } else { !equal }));
    }

    if b.op.is_ordering() {
        // Lifted comparisons with null are false
        if left.is_null() || right.is_null() {
            return Ok(Value::Boolean(false));
        }
        let ordering = compare(&left, &right).ok_or_else(|| type_mismatch(b.op.symbol(), &[&left, &right]))?;
        let result = match b.op {
            BinaryOp::Less => ordering == Ordering::Less,
            BinaryOp::LessOrEqual => ordering != Ordering::Greater,
            BinaryOp::Greater => ordering == Ordering::Greater,
            _ => ordering != Ordering::Less,
        };
        return Ok(Value::Boolean(result));
    }

    arithmetic(b.op, left, right, &b.ty)
}

fn eval_logical(b: &BinaryExpr, budget: usize) -> EvalResult<Value> {
    let as_bool = |value: Value| match value {
        Value::Boolean(v) => Ok(v),
        other => Err(type_mismatch(b.op.symbol(), &[&other])),
    };
    let left = as_bool(eval(&b.left, budget)?)?;
    let short_circuit = match b.op {
        BinaryOp::And => !left,
        _ => left,
    };
    if short_circuit {
        return Ok(Value::Boolean(left));
    }
    as_bool(eval(&b.right, budget)?).map(Value::Boolean)
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left.is_null(), right.is_null()) {
        (true, true) => true,
        (true, false) | (false, true) => false,
        _ => compare(left, right).map_or_else(|| left == right, |o| o == Ordering::Equal),
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (numeric(left), numeric(right)) {
        return match promote(a, b)? {
            (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
            (Num::Dec(a), Num::Dec(b)) => Some(a.cmp(&b)),
            (a, b) => to_float(a).partial_cmp(&to_float(b)),
        };
    }
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        (Value::Guid(a), Value::Guid(b)) => Some(a.cmp(b)),
        (Value::DateTime(DateTimeValue::Offset(a)), Value::DateTime(DateTimeValue::Offset(b))) => {
            Some(a.cmp(b))
        }
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.naive().cmp(&b.naive())),
        _ => None,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Char(c) => Some(c.to_string()),
        _ => None,
    }
}

fn arithmetic(op: BinaryOp, left: Value, right: Value, ty: &HostType) -> EvalResult<Value> {
    if op == BinaryOp::Add && (ty.is_text() || matches!(left, Value::String(_))) {
        let l = if left.is_null() { Some(String::new()) } else { text(&left) };
        let r = if right.is_null() { Some(String::new()) } else { text(&right) };
        return match (l, r) {
            (Some(l), Some(r)) => Ok(Value::String(l + &r)),
            _ => Err(type_mismatch(op.symbol(), &[&left, &right])),
        };
    }

    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }

    let mismatch = || type_mismatch(op.symbol(), &[&left, &right]);
    let (a, b) = match (numeric(&left), numeric(&right)) {
        (Some(a), Some(b)) => promote(a, b).ok_or_else(mismatch)?,
        _ => return Err(mismatch()),
    };
    let name = op.symbol();

    match (a, b) {
        (Num::Int(a), Num::Int(b)) => {
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Subtract => a.checked_sub(b),
                BinaryOp::Multiply => a.checked_mul(b),
                BinaryOp::Divide | BinaryOp::Modulo if b == 0 => {
                    return Err(EvalError::DivisionByZero);
                }
                BinaryOp::Divide => a.checked_div(b),
                BinaryOp::Modulo => a.checked_rem(b),
                _ => return Err(mismatch()),
            };
            integer_value(result.ok_or_else(|| overflow(name))?, ty, name)
        }
        (Num::Dec(a), Num::Dec(b)) => {
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Subtract => a.checked_sub(b),
                BinaryOp::Multiply => a.checked_mul(b),
                BinaryOp::Divide | BinaryOp::Modulo if b.is_zero() => {
                    return Err(EvalError::DivisionByZero);
                }
                BinaryOp::Divide => a.checked_div(b),
                BinaryOp::Modulo => a.checked_rem(b),
                _ => return Err(mismatch()),
            };
            result.map(Value::Decimal).ok_or_else(|| overflow(name))
        }
        (a, b) => {
            let (a, b) = (to_float(a), to_float(b));
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Subtract => a - b,
                BinaryOp::Multiply => a * b,
                BinaryOp::Divide => a / b,
                BinaryOp::Modulo => a % b,
                _ => return Err(mismatch()),
            };
            Ok(float_value(result, ty))
        }
    }
}

// ============================================================================
// Method calls
// ============================================================================

fn eval_call(call: &MethodCall, budget: usize) -> EvalResult<Value> {
    let target = call.target.as_deref().map(|e| eval(e, budget)).transpose()?;
    let args = call.args.iter().map(|e| eval(e, budget)).collect::<EvalResult<Vec<_>>>()?;
    let method = call.method.name.as_str();

    if let Some(host) = &call.method.host {
        let mut host_args = Vec::with_capacity(args.len() + 1);
        host_args.extend(target);
        host_args.extend(args);
        return host.invoke(&host_args).map_err(|message| EvalError::HostFailure {
            method: method.to_string(),
            message,
        });
    }

    let unknown = || EvalError::NotEvaluable {
        expression: format!("{}.{}", call.method.declaring_type, method),
    };

    match target {
        Some(Value::Null) => Err(EvalError::NullReference {
            member: method.to_string(),
        }),
        Some(Value::String(s)) => string_method(&s, method, &args).ok_or_else(unknown)?,
        Some(_) => Err(unknown()),
        None => static_method(&call.method.declaring_type, method, &args).ok_or_else(unknown)?,
    }
}

fn char_index(s: &str, index: &Value, length: usize) -> EvalResult<usize> {
    let i = index.as_i64().unwrap_or(-1);
    usize::try_from(i)
        .ok()
        .filter(|i| *i <= length)
        .ok_or(EvalError::IndexOutOfRange {
            index: i,
            length: s.chars().count(),
        })
}

/// Char position of `needle` at or after char `start`, or -1
fn index_of(s: &str, needle: &str, start: usize) -> EvalResult<Value> {
    let offset = s.char_indices().nth(start).map_or(s.len(), |(byte, _)| byte);
    let position = s[offset..]
        .find(needle)
        .map_or(-1, |byte| s[..offset + byte].chars().count() as i64);
    integer_value(position, &HostType::Int32, "IndexOf")
}

fn string_method(s: &str, method: &str, args: &[Value]) -> Option<EvalResult<Value>> {
    let texts: Option<Vec<String>> = args.iter().map(text).collect();
    let result = match (method, args) {
        ("ToLower", []) => Ok(Value::String(s.to_lowercase())),
        ("ToUpper", []) => Ok(Value::String(s.to_uppercase())),
        ("Trim", []) => Ok(Value::String(s.trim().to_string())),
        ("Contains", [_]) => Ok(Value::Boolean(s.contains(texts?[0].as_str()))),
        ("StartsWith", [_]) => Ok(Value::Boolean(s.starts_with(texts?[0].as_str()))),
        ("EndsWith", [_]) => Ok(Value::Boolean(s.ends_with(texts?[0].as_str()))),
        ("Replace", [_, _]) => {
            let texts = texts?;
            Ok(Value::String(s.replace(texts[0].as_str(), texts[1].as_str())))
        }
        ("IndexOf", [_]) => index_of(s, &texts?[0], 0),
        ("IndexOf", [needle, start]) => {
            let needle = text(needle)?;
            char_index(s, start, s.chars().count()).and_then(|start| index_of(s, &needle, start))
        }
        ("Substring", [start]) => {
            let len = s.chars().count();
            char_index(s, start, len).map(|start| Value::String(s.chars().skip(start).collect()))
        }
        ("Substring", [start, count]) => {
            let len = s.chars().count();
            char_index(s, start, len).and_then(|start| {
                let count = char_index(s, count, len - start)?;
                Ok(Value::String(s.chars().skip(start).take(count).collect()))
            })
        }
        _ => return None,
    };
    Some(result)
}

fn static_method(declaring_type: &HostType, method: &str, args: &[Value]) -> Option<EvalResult<Value>> {
    let result = match (declaring_type.underlying(), method, args) {
        (HostType::String, "Concat", _) => {
            let parts: Option<Vec<String>> = args
                .iter()
                .map(|a| if a.is_null() { Some(String::new()) } else { text(a) })
                .collect();
            Ok(Value::String(parts?.concat()))
        }
        (HostType::Named(name), "Round" | "Floor" | "Ceiling", [value]) if name == "Math" => {
            let round = |v: f64| match method {
                "Round" => v.round_ties_even(),
                "Floor" => v.floor(),
                _ => v.ceil(),
            };
            match value {
                Value::Double(v) => Ok(Value::Double(round(*v))),
                Value::Single(v) => Ok(Value::Single(round(f64::from(*v)) as f32)),
                Value::Decimal(v) => Ok(Value::Decimal(match method {
                    "Round" => v.round(),
                    "Floor" => v.floor(),
                    _ => v.ceil(),
                })),
                other => Err(type_mismatch(method, &[other])),
            }
        }
        _ => return None,
    };
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use restq_expr::{HostFunction, ObjectValue};
    use std::str::FromStr;

    fn container() -> Expression {
        Expression::closure(
            ObjectValue::new("Container")
                .with_field("Junk", "Kirk")
                .with_field("Count", 3)
                .with_field("Nested", ObjectValue::new("Inner").with_field("Value", 7))
                .with_field("Missing", Value::Null),
        )
    }

    #[test]
    fn test_closure_member_chain() {
        let expr = container()
            .member("Nested", HostType::named("Inner"))
            .member("Value", HostType::Int32);
        assert_eq!(evaluate(&expr).unwrap(), Value::Int32(7));
    }

    #[test]
    fn test_null_reference() {
        let expr = container()
            .member("Missing", HostType::named("Inner"))
            .member("Value", HostType::Int32);
        assert_eq!(
            evaluate(&expr),
            Err(EvalError::NullReference {
                member: "Value".to_string()
            })
        );
    }

    #[test]
    fn test_division_by_zero() {
        let expr = container()
            .member("Count", HostType::Int32)
            .divided_by(Expression::constant(0));
        assert_eq!(evaluate(&expr), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_checked_overflow() {
        let expr = Expression::constant(i32::MAX).plus(Expression::constant(1));
        assert!(matches!(evaluate(&expr), Err(EvalError::Overflow { .. })));
    }

    #[test]
    fn test_mixed_numeric_promotion() {
        let decimal = Decimal::from_str("1.5").unwrap();
        let expr = Expression::constant(decimal).plus(Expression::constant(2).convert(HostType::Decimal));
        assert_eq!(evaluate(&expr).unwrap(), Value::Decimal(Decimal::from_str("3.5").unwrap()));

        let expr = Expression::constant(7.5).times(Expression::constant(2).convert(HostType::Double));
        assert_eq!(evaluate(&expr).unwrap(), Value::Double(15.0));
    }

    #[test]
    fn test_string_concat_and_methods() {
        let expr = container()
            .member("Junk", HostType::String)
            .plus(Expression::constant("!"));
        assert_eq!(evaluate(&expr).unwrap(), Value::from("Kirk!"));

        let lower = container()
            .member("Junk", HostType::String)
            .call("ToLower", vec![], HostType::String);
        assert_eq!(evaluate(&lower).unwrap(), Value::from("kirk"));

        let sub = Expression::constant("Gangnam").call(
            "Substring",
            vec![Expression::constant(1), Expression::constant(2)],
            HostType::String,
        );
        assert_eq!(evaluate(&sub).unwrap(), Value::from("an"));

        let out_of_range = Expression::constant("ab").call(
            "Substring",
            vec![Expression::constant(5)],
            HostType::String,
        );
        assert!(matches!(
            evaluate(&out_of_range),
            Err(EvalError::IndexOutOfRange { index: 5, .. })
        ));
    }

    #[test]
    fn test_host_function_receives_target_first() {
        let repeat = HostFunction::new(|args| match args {
            [Value::String(s), Value::Int32(n)] => Ok(Value::String(s.repeat(*n as usize))),
            _ => Err("bad arguments".to_string()),
        });
        let expr = Expression::constant("ab").call_host(
            "Repeat",
            vec![Expression::constant(2)],
            HostType::String,
            repeat,
        );
        assert_eq!(evaluate(&expr).unwrap(), Value::from("abab"));

        let failing = HostFunction::new(|_| Err("boom".to_string()));
        let expr = Expression::constant("ab").call_host("Explode", vec![], HostType::String, failing);
        assert!(matches!(evaluate(&expr), Err(EvalError::HostFailure { .. })));
    }

    #[test]
    fn test_dictionary_and_list_index() {
        let dict = Expression::constant(Value::dictionary([("noob", Value::from("bob"))]));
        let hit = dict.clone().index(Expression::constant("noob"), HostType::String);
        assert_eq!(evaluate(&hit).unwrap(), Value::from("bob"));

        let miss = dict.index(Expression::constant("pro"), HostType::String);
        assert!(matches!(evaluate(&miss), Err(EvalError::KeyNotFound { .. })));

        let list = Expression::constant(Value::list(vec![Value::Int32(4)]));
        let oob = list.index(Expression::constant(3), HostType::Int32);
        assert!(matches!(evaluate(&oob), Err(EvalError::IndexOutOfRange { index: 3, length: 1 })));
    }

    #[test]
    fn test_comparisons_and_short_circuit() {
        let lt = Expression::constant(2).less(Expression::constant(3));
        assert_eq!(evaluate(&lt).unwrap(), Value::Boolean(true));

        // The right operand would fail, but is never evaluated
        let boom = Expression::constant(1)
            .divided_by(Expression::constant(0))
            .equal(Expression::constant(1));
        let and = Expression::constant(false).and_also(boom);
        assert_eq!(evaluate(&and).unwrap(), Value::Boolean(false));

        let null_eq = Expression::null(HostType::String).equal(Expression::null(HostType::String));
        assert_eq!(evaluate(&null_eq).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_date_components_and_convert() {
        let dt = NaiveDate::from_ymd_opt(2012, 10, 22)
            .unwrap()
            .and_hms_opt(5, 32, 45)
            .unwrap();
        let year = Expression::constant(DateTimeValue::Utc(dt)).member("Year", HostType::Int32);
        assert_eq!(evaluate(&year).unwrap(), Value::Int32(2012));

        let narrowed = Expression::constant(10.9).convert(HostType::Int32);
        assert_eq!(evaluate(&narrowed).unwrap(), Value::Int32(10));

        let too_big = Expression::constant(300).convert(HostType::Byte);
        assert!(matches!(evaluate(&too_big), Err(EvalError::Overflow { .. })));
    }

    #[test]
    fn test_parameter_is_not_evaluable() {
        let x = Expression::param("x", HostType::named("TestResource"));
        assert!(matches!(evaluate(&x), Err(EvalError::NotEvaluable { .. })));
    }

    #[test]
    fn test_index_of_from_start() {
        let from = |start: i32| {
            Expression::constant("abcb").call(
                "IndexOf",
                vec![Expression::constant("b"), Expression::constant(start)],
                HostType::Int32,
            )
        };
        assert_eq!(evaluate(&from(0)).unwrap(), Value::Int32(1));
        assert_eq!(evaluate(&from(2)).unwrap(), Value::Int32(3));
        assert_eq!(evaluate(&from(4)).unwrap(), Value::Int32(-1));
        assert!(matches!(
            evaluate(&from(5)),
            Err(EvalError::IndexOutOfRange { index: 5, length: 4 })
        ));
    }

    #[test]
    fn test_float_to_long_bounds() {
        // 2^63 is the first double past i64::MAX
        let edge = Expression::constant(9_223_372_036_854_775_808.0f64).convert(HostType::Int64);
        assert!(matches!(evaluate(&edge), Err(EvalError::Overflow { .. })));

        let below = Expression::constant(-9_223_372_036_854_775_808.0f64).convert(HostType::Int64);
        assert_eq!(evaluate(&below).unwrap(), Value::Int64(i64::MIN));
    }

    #[test]
    fn test_nesting_budget() {
        let mut expr = Expression::constant(1);
        for _ in 0..10 {
            expr = expr.negate();
        }
        assert_eq!(evaluate_within(&expr, 10).unwrap(), Value::Int32(1));
        assert_eq!(evaluate_within(&expr, 9), Err(EvalError::DepthExceeded));
    }

    #[test]
    fn test_nullable_has_value() {
        let maybe = HostType::nullable(HostType::Int32);
        let empty = Expression::null(maybe.clone()).member("HasValue", HostType::Boolean);
        assert_eq!(evaluate(&empty).unwrap(), Value::Boolean(false));

        let five = Expression::constant(5).convert(maybe).member("HasValue", HostType::Boolean);
        assert_eq!(evaluate(&five).unwrap(), Value::Boolean(true));
    }
}
