//! Allow-list of host members with a function form in the filter grammar
//!
//! Each entry maps one host method overload (or property) onto a canonical
//! function name and fixes the order in which the receiver and the call-site
//! arguments are emitted.

use restq_expr::HostType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical filter functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    SubstringOf,
    StartsWith,
    EndsWith,
    IndexOf,
    Substring,
    Replace,
    ToLower,
    ToUpper,
    Trim,
    Concat,
    Length,
    Count,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Round,
    Floor,
    Ceiling,
}

impl Function {
    /// Name as printed in the filter grammar
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SubstringOf => "substringof",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::IndexOf => "indexof",
            Self::Substring => "substring",
            Self::Replace => "replace",
            Self::ToLower => "tolower",
            Self::ToUpper => "toupper",
            Self::Trim => "trim",
            Self::Concat => "concat",
            Self::Length => "length",
            Self::Count => "count",
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::Round => "round",
            Self::Floor => "floor",
            Self::Ceiling => "ceiling",
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receiver category a member is looked up on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Receiver {
    String,
    DateTime,
    Sequence,
    Math,
}

impl Receiver {
    /// Categorize a declaring type
    pub fn of(ty: &HostType) -> Option<Self> {
        match ty.underlying() {
            HostType::String => Some(Self::String),
            HostType::DateTime | HostType::DateTimeOffset => Some(Self::DateTime),
            HostType::List(_) | HostType::Queryable(_) => Some(Self::Sequence),
            HostType::Named(name) if name == "Math" => Some(Self::Math),
            _ => None,
        }
    }
}

/// How a member is accessed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// `target.Member`
    Property,
    /// `target.Method(args)`
    Instance,
    /// `Type.Method(args)`
    Static,
}

/// Accepted argument kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// String or char
    Text,
    Integer,
    Numeric,
}

impl ArgKind {
    pub fn accepts(&self, ty: &HostType) -> bool {
        match self {
            Self::Text => ty.is_text(),
            Self::Integer => ty.is_integer(),
            Self::Numeric => ty.is_numeric(),
        }
    }

    const fn describe(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Numeric => "numeric",
        }
    }
}

/// Position of the receiver among the printed arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverPosition {
    /// `f(target,args...)`
    First,
    /// `f(args...,target)`
    Last,
    /// No receiver (static call)
    None,
}

/// One allow-list entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSignature {
    pub receiver: Receiver,
    pub member: &'static str,
    pub access: Access,
    pub params: &'static [ArgKind],
    pub function: Function,
    pub position: ReceiverPosition,
}

const fn entry(
    receiver: Receiver,
    member: &'static str,
    access: Access,
    params: &'static [ArgKind],
    function: Function,
    position: ReceiverPosition,
) -> FunctionSignature {
    FunctionSignature {
        receiver,
        member,
        access,
        params,
        function,
        position,
    }
}

use Access::{Instance, Property, Static};
use ArgKind::{Integer, Numeric, Text};
use ReceiverPosition::{First, Last};

static FUNCTIONS: &[FunctionSignature] = &[
    // `haystack.Contains(needle)` prints needle first
    entry(Receiver::String, "Contains", Instance, &[Text], Function::SubstringOf, Last),
    entry(Receiver::String, "StartsWith", Instance, &[Text], Function::StartsWith, First),
    entry(Receiver::String, "EndsWith", Instance, &[Text], Function::EndsWith, First),
    entry(Receiver::String, "IndexOf", Instance, &[Text], Function::IndexOf, First),
    entry(Receiver::String, "IndexOf", Instance, &[Text, Integer], Function::IndexOf, First),
    entry(Receiver::String, "Substring", Instance, &[Integer], Function::Substring, First),
    entry(Receiver::String, "Substring", Instance, &[Integer, Integer], Function::Substring, First),
    entry(Receiver::String, "Replace", Instance, &[Text, Text], Function::Replace, First),
    entry(Receiver::String, "ToLower", Instance, &[], Function::ToLower, First),
    entry(Receiver::String, "ToUpper", Instance, &[], Function::ToUpper, First),
    entry(Receiver::String, "Trim", Instance, &[], Function::Trim, First),
    entry(Receiver::String, "Concat", Static, &[Text, Text], Function::Concat, ReceiverPosition::None),
    entry(Receiver::String, "Length", Property, &[], Function::Length, First),
    entry(Receiver::Sequence, "Count", Property, &[], Function::Count, First),
    entry(Receiver::Sequence, "Count", Instance, &[], Function::Count, First),
    entry(Receiver::DateTime, "Year", Property, &[], Function::Year, First),
    entry(Receiver::DateTime, "Month", Property, &[], Function::Month, First),
    entry(Receiver::DateTime, "Day", Property, &[], Function::Day, First),
    entry(Receiver::DateTime, "Hour", Property, &[], Function::Hour, First),
    entry(Receiver::DateTime, "Minute", Property, &[], Function::Minute, First),
    entry(Receiver::DateTime, "Second", Property, &[], Function::Second, First),
    entry(Receiver::Math, "Round", Static, &[Numeric], Function::Round, ReceiverPosition::None),
    entry(Receiver::Math, "Floor", Static, &[Numeric], Function::Floor, ReceiverPosition::None),
    entry(Receiver::Math, "Ceiling", Static, &[Numeric], Function::Ceiling, ReceiverPosition::None),
];

/// Outcome of an allow-list lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// An overload matched the argument types
    Found(&'static FunctionSignature),
    /// The member is known but no overload accepts these arguments
    Mismatch { function: Function, message: String },
    /// The member is not on the allow-list
    Unknown,
}

/// Find the allow-list entry for a member access or call
pub fn lookup(receiver: Receiver, member: &str, access: Access, arg_types: &[HostType]) -> Lookup {
    let candidates: Vec<&'static FunctionSignature> = FUNCTIONS
        .iter()
        .filter(|sig| sig.receiver == receiver && sig.member == member && sig.access == access)
        .collect();

    let Some(first) = candidates.first() else {
        return Lookup::Unknown;
    };

    let matching = candidates.iter().find(|sig| {
        sig.params.len() == arg_types.len()
            && sig.params.iter().zip(arg_types).all(|(kind, ty)| kind.accepts(ty))
    });

    match matching {
        Some(sig) => Lookup::Found(sig),
        None => {
            let expected: Vec<String> = candidates
                .iter()
                .map(|sig| {
                    let params: Vec<&str> = sig.params.iter().map(ArgKind::describe).collect();
                    format!("({})", params.join(", "))
                })
                .collect();
            let actual: Vec<String> = arg_types.iter().map(ToString::to_string).collect();
            Lookup::Mismatch {
                function: first.function,
                message: format!(
                    "expected one of {} but got ({})",
                    expected.join(" or "),
                    actual.join(", ")
                ),
            }
        }
    }
}
