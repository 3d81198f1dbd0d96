//! Typed constant values carried by host expression trees

use crate::HostType;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Timelike};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A constant value in a host expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null reference
    Null,
    Boolean(bool),
    Byte(u8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    Char(char),
    String(String),
    DateTime(DateTimeValue),
    Guid(Uuid),
    /// Captured host object (closure environment, nested record)
    Object(Arc<ObjectValue>),
    /// Captured list
    List(Arc<Vec<Value>>),
    /// Captured string-keyed dictionary
    Dictionary(Arc<IndexMap<String, Value>>),
}

impl Value {
    /// Get the natural host type of this value
    pub fn host_type(&self) -> HostType {
        match self {
            Self::Null => HostType::Object,
            Self::Boolean(_) => HostType::Boolean,
            Self::Byte(_) => HostType::Byte,
            Self::Int16(_) => HostType::Int16,
            Self::Int32(_) => HostType::Int32,
            Self::Int64(_) => HostType::Int64,
            Self::Single(_) => HostType::Single,
            Self::Double(_) => HostType::Double,
            Self::Decimal(_) => HostType::Decimal,
            Self::Char(_) => HostType::Char,
            Self::String(_) => HostType::String,
            Self::DateTime(DateTimeValue::Offset(_)) => HostType::DateTimeOffset,
            Self::DateTime(_) => HostType::DateTime,
            Self::Guid(_) => HostType::Guid,
            Self::Object(obj) => HostType::Named(obj.type_name.clone()),
            Self::List(_) => HostType::list(HostType::Object),
            Self::Dictionary(_) => HostType::dictionary(HostType::String, HostType::Object),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Create a captured object value
    pub fn object(object: ObjectValue) -> Self {
        Self::Object(Arc::new(object))
    }

    /// Create a captured list value
    pub fn list(items: Vec<Value>) -> Self {
        Self::List(Arc::new(items))
    }

    /// Create a captured dictionary value
    pub fn dictionary<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Dictionary(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Widen an integral value to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Int16(v) => Some(i64::from(*v)),
            Self::Int32(v) => Some(i64::from(*v)),
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Single(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Self::Guid(v)
    }
}

impl From<DateTimeValue> for Value {
    fn from(v: DateTimeValue) -> Self {
        Self::DateTime(v)
    }
}

impl From<ObjectValue> for Value {
    fn from(v: ObjectValue) -> Self {
        Self::object(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Kind of a date/time value, preserved through formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTimeKind {
    /// No zone information
    Unspecified,
    /// Local wall-clock time
    Local,
    /// Coordinated universal time
    Utc,
    /// Explicit offset from UTC
    Offset,
}

/// A date/time value with its declared kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTimeValue {
    Unspecified(NaiveDateTime),
    Local(NaiveDateTime),
    Utc(NaiveDateTime),
    Offset(DateTime<FixedOffset>),
}

impl DateTimeValue {
    pub fn kind(&self) -> DateTimeKind {
        match self {
            Self::Unspecified(_) => DateTimeKind::Unspecified,
            Self::Local(_) => DateTimeKind::Local,
            Self::Utc(_) => DateTimeKind::Utc,
            Self::Offset(_) => DateTimeKind::Offset,
        }
    }

    /// Wall-clock date and time, without zone information
    pub fn naive(&self) -> NaiveDateTime {
        match self {
            Self::Unspecified(dt) | Self::Local(dt) | Self::Utc(dt) => *dt,
            Self::Offset(dt) => dt.naive_local(),
        }
    }

    pub fn year(&self) -> i32 {
        self.naive().year()
    }

    pub fn month(&self) -> u32 {
        self.naive().month()
    }

    pub fn day(&self) -> u32 {
        self.naive().day()
    }

    pub fn hour(&self) -> u32 {
        self.naive().hour()
    }

    pub fn minute(&self) -> u32 {
        self.naive().minute()
    }

    pub fn second(&self) -> u32 {
        self.naive().second()
    }
}

/// A captured host object: a type name plus ordered named fields
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValue {
    /// Declared type name of the object
    pub type_name: String,
    /// Field values in declaration order
    pub fields: IndexMap<String, Value>,
}

impl ObjectValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Signature of a host-provided method body used during constant folding.
///
/// Instance methods receive the target as the first argument.
pub type HostFn = dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync;

/// A host method implementation that can be invoked on closed-over values
#[derive(Clone)]
pub struct HostFunction(Arc<HostFn>);

impl HostFunction {
    pub fn new(f: impl Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invoke the host method
    pub fn invoke(&self, args: &[Value]) -> Result<Value, String> {
        (self.0)(args)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HostFunction(..)")
    }
}
