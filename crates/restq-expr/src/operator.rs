//! Host expression operators

use serde::{Deserialize, Serialize};

/// Binary operators of the host expression language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Short-circuit logical or
    Or,
    /// Short-circuit logical and
    And,

    /// Equality
    Equal,
    /// Inequality
    NotEqual,

    /// Less than
    Less,
    /// Less than or equal
    LessOrEqual,
    /// Greater than
    Greater,
    /// Greater than or equal
    GreaterOrEqual,

    /// Addition (also string concatenation)
    Add,
    /// Subtraction
    Subtract,

    /// Multiplication
    Multiply,
    /// Division
    Divide,
    /// Remainder
    Modulo,
}

impl BinaryOp {
    /// Check if this is an equality operator
    pub const fn is_equality(&self) -> bool {
        matches!(self, Self::Equal | Self::NotEqual)
    }

    /// Check if this is an ordering comparison
    pub const fn is_ordering(&self) -> bool {
        matches!(
            self,
            Self::Less | Self::LessOrEqual | Self::Greater | Self::GreaterOrEqual
        )
    }

    /// Check if this is a comparison operator
    pub const fn is_comparison(&self) -> bool {
        self.is_equality() || self.is_ordering()
    }

    /// Check if this is a logical operator
    pub const fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Check if this is an arithmetic operator
    pub const fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide | Self::Modulo
        )
    }

    /// Get the host-language operator symbol
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Or => "||",
            Self::And => "&&",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
        }
    }
}

/// Unary operators of the host expression language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical negation
    Not,
    /// Arithmetic negation
    Negate,
    /// Type conversion or boxing (target type is the node's type)
    Convert,
}

impl UnaryOp {
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Not => "Not",
            Self::Negate => "-",
            Self::Convert => "Convert",
        }
    }
}
