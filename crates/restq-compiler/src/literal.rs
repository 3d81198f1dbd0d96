//! Literal formatting
//!
//! Turns a typed constant into its canonical literal token. Percent-encoding
//! for the URI is left to the query-string builder.

use crate::LiteralError;
use restq_expr::{DateTimeValue, Value};

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Format a constant as a filter literal
pub fn format_literal(value: &Value) -> Result<String, LiteralError> {
    let literal = match value {
        Value::Null => "null".to_string(),
        Value::Boolean(true) => "true".to_string(),
        Value::Boolean(false) => "false".to_string(),
        Value::Byte(v) => v.to_string(),
        Value::Int16(v) => v.to_string(),
        Value::Int32(v) => v.to_string(),
        Value::Int64(v) => format!("{}L", v),
        Value::Single(v) => {
            if !v.is_finite() {
                return Err(LiteralError::NonFinite {
                    value: v.to_string(),
                });
            }
            format!("{}f", v)
        }
        Value::Double(v) => format_double(*v)?,
        Value::Decimal(v) => format!("{}m", v),
        Value::Char(c) => quote(&c.to_string()),
        Value::String(s) => quote(s),
        Value::DateTime(dt) => format!("datetime'{}'", format_date_time(dt)),
        Value::Guid(g) => format!("guid'{}'", g.hyphenated()),
        Value::Object(_) | Value::List(_) | Value::Dictionary(_) => {
            return Err(LiteralError::UnsupportedValue {
                type_name: value.host_type().type_name(),
            });
        }
    };
    Ok(literal)
}

fn format_double(v: f64) -> Result<String, LiteralError> {
    if !v.is_finite() {
        return Err(LiteralError::NonFinite {
            value: v.to_string(),
        });
    }
    let mut text = v.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    Ok(text)
}

/// Single-quote a string, doubling embedded quotes
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

fn format_date_time(dt: &DateTimeValue) -> String {
    match dt {
        DateTimeValue::Unspecified(naive) | DateTimeValue::Local(naive) => {
            naive.format(DATE_TIME_FORMAT).to_string()
        }
        DateTimeValue::Utc(naive) => format!("{}Z", naive.format(DATE_TIME_FORMAT)),
        DateTimeValue::Offset(with_offset) => with_offset
            .format(&format!("{}%:z", DATE_TIME_FORMAT))
            .to_string(),
    }
}
