//! Host type descriptors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a host expression node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostType {
    /// Boolean type
    Boolean,
    /// Unsigned 8-bit integer
    Byte,
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// Single precision floating point
    Single,
    /// Double precision floating point
    Double,
    /// Fixed-point decimal
    Decimal,
    /// Single character
    Char,
    /// String type
    String,
    /// Date and time (UTC, local or unspecified kind)
    DateTime,
    /// Date and time with an explicit offset
    DateTimeOffset,
    /// Globally unique identifier
    Guid,
    /// Untyped object (top type)
    Object,
    /// Optional value of the inner type
    Nullable(Box<HostType>),
    /// Ordered collection
    List(Box<HostType>),
    /// Key/value map
    Dictionary(Box<HostType>, Box<HostType>),
    /// Server-side queryable sequence
    Queryable(Box<HostType>),
    /// Positional tuple
    Tuple(Vec<HostType>),
    /// Compiler-generated record type with named members
    Anonymous(String),
    /// Named resource, complex or static holder type
    Named(String),
}

impl HostType {
    /// Create a named type
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Create an anonymous record type
    pub fn anonymous(name: impl Into<String>) -> Self {
        Self::Anonymous(name.into())
    }

    /// Create a list type
    pub fn list(element: HostType) -> Self {
        Self::List(Box::new(element))
    }

    /// Create a nullable type
    pub fn nullable(inner: HostType) -> Self {
        Self::Nullable(Box::new(inner))
    }

    /// Create a dictionary type
    pub fn dictionary(key: HostType, value: HostType) -> Self {
        Self::Dictionary(Box::new(key), Box::new(value))
    }

    /// Create a queryable sequence type
    pub fn queryable(element: HostType) -> Self {
        Self::Queryable(Box::new(element))
    }

    /// Strip any nullable wrapper
    pub fn underlying(&self) -> &HostType {
        match self {
            Self::Nullable(inner) => inner.underlying(),
            other => other,
        }
    }

    /// Whether values of this type may be null
    pub fn is_nullable(&self) -> bool {
        !matches!(
            self,
            Self::Boolean
                | Self::Byte
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Single
                | Self::Double
                | Self::Decimal
                | Self::Char
                | Self::DateTime
                | Self::DateTimeOffset
                | Self::Guid
        )
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.underlying(), Self::Boolean)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.underlying(),
            Self::Byte | Self::Int16 | Self::Int32 | Self::Int64
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer()
            || matches!(
                self.underlying(),
                Self::Single | Self::Double | Self::Decimal
            )
    }

    /// Whether this type is textual (string or char)
    pub fn is_text(&self) -> bool {
        matches!(self.underlying(), Self::String | Self::Char)
    }

    pub fn is_date_time(&self) -> bool {
        matches!(self.underlying(), Self::DateTime | Self::DateTimeOffset)
    }

    /// Whether this type is a sequence (list or queryable)
    pub fn is_sequence(&self) -> bool {
        matches!(self.underlying(), Self::List(_) | Self::Queryable(_))
    }

    /// Element type of a sequence
    pub fn element_type(&self) -> Option<&HostType> {
        match self.underlying() {
            Self::List(elem) | Self::Queryable(elem) => Some(elem),
            _ => None,
        }
    }

    /// Whether this is a record type whose construction denotes a projection
    pub fn is_record_like(&self) -> bool {
        matches!(self, Self::Anonymous(_) | Self::Tuple(_))
    }

    /// Name used to key metadata lookups
    pub fn type_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "Boolean"),
            Self::Byte => write!(f, "Byte"),
            Self::Int16 => write!(f, "Int16"),
            Self::Int32 => write!(f, "Int32"),
            Self::Int64 => write!(f, "Int64"),
            Self::Single => write!(f, "Single"),
            Self::Double => write!(f, "Double"),
            Self::Decimal => write!(f, "Decimal"),
            Self::Char => write!(f, "Char"),
            Self::String => write!(f, "String"),
            Self::DateTime => write!(f, "DateTime"),
            Self::DateTimeOffset => write!(f, "DateTimeOffset"),
            Self::Guid => write!(f, "Guid"),
            Self::Object => write!(f, "Object"),
            Self::Nullable(inner) => write!(f, "{}?", inner),
            Self::List(elem) => write!(f, "List<{}>", elem),
            Self::Dictionary(key, value) => write!(f, "Dictionary<{}, {}>", key, value),
            Self::Queryable(elem) => write!(f, "Queryable<{}>", elem),
            Self::Tuple(items) => {
                write!(f, "Tuple<")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ">")
            }
            Self::Anonymous(name) | Self::Named(name) => write!(f, "{}", name),
        }
    }
}
